use crate::message::RawMessage;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Latest [`RawMessage`] per key.
///
/// Inserting replaces any previous message for the same key. Nothing is
/// ever evicted.
#[derive(Debug, Default)]
pub struct MessageCache {
    messages: RwLock<HashMap<String, Arc<RawMessage>>>,
}

impl MessageCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `message`, returning the one it replaced
    pub fn insert(&self, message: RawMessage) -> Option<Arc<RawMessage>> {
        let key = message.key().to_string();
        self.messages.write().insert(key, Arc::new(message))
    }

    /// Latest message for `key`
    pub fn get(&self, key: &str) -> Option<Arc<RawMessage>> {
        self.messages.read().get(key).cloned()
    }

    /// Cached keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.messages.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Whether nothing has been cached
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}
