use crate::cache::MessageCache;
use crate::frame::extract_next_frame;

use parking_lot::Mutex;
use pyon_connection::{Connection, ConnectionEvent, EventBus, UpdateHandler};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, trace};

/// Names the Rust type a protocol key materializes into.
pub trait KeyTypeResolver: Debug + Send + Sync + 'static {
    /// Type name registered for `key`, if any
    fn type_name_for(&self, key: &str) -> Option<&'static str>;
}

/// Splits received text into frames and stores them in a [`MessageCache`].
///
/// Text that does not yet form a complete frame is kept until the next pass.
#[derive(Debug)]
pub struct Framer {
    accumulator: Mutex<String>,
    cache: Arc<MessageCache>,
    resolver: Option<Arc<dyn KeyTypeResolver>>,
}

impl Framer {
    /// Create a framer writing into `cache`
    #[must_use]
    pub fn new(cache: Arc<MessageCache>, resolver: Option<Arc<dyn KeyTypeResolver>>) -> Self {
        Self {
            accumulator: Mutex::new(String::new()),
            cache,
            resolver,
        }
    }

    /// Append `text` and extract every complete frame.
    ///
    /// Publishes `MessageUpdated` for each frame in order, then
    /// `UpdateFinished`. Returns the number of frames extracted.
    pub fn process(&self, text: &str, events: &EventBus) -> usize {
        let mut updated = Vec::new();
        {
            let mut accumulator = self.accumulator.lock();
            accumulator.push_str(text);

            let mut consumed = 0;
            while let Some((message, rest)) = extract_next_frame(&accumulator[consumed..]) {
                consumed = accumulator.len() - rest.len();
                trace!("Extracted message '{}'", message.key());

                let key = message.key().to_string();
                self.cache.insert(message);
                updated.push(key);
            }

            accumulator.drain(..consumed);
        }

        let count = updated.len();
        for key in updated {
            let type_name = self
                .resolver
                .as_ref()
                .and_then(|resolver| resolver.type_name_for(&key));
            events.publish(ConnectionEvent::MessageUpdated { key, type_name });
        }
        events.publish(ConnectionEvent::UpdateFinished);

        count
    }

    /// Text received but not yet part of a complete frame
    pub fn pending_text(&self) -> String {
        self.accumulator.lock().clone()
    }

    /// Discard any partial frame
    pub fn reset(&self) {
        let mut accumulator = self.accumulator.lock();
        if !accumulator.is_empty() {
            debug!("Discarding {} bytes of unframed text", accumulator.len());
            accumulator.clear();
        }
    }

    /// Cache this framer writes into
    #[must_use]
    pub fn cache(&self) -> &Arc<MessageCache> {
        &self.cache
    }
}

impl UpdateHandler for Framer {
    fn after_update(&self, connection: &Connection) {
        let text = connection.get_buffer(true);
        self.process(&text, connection.events());
    }

    fn on_connected(&self, _connection: &Connection) {
        self.reset();
    }
}
