use parking_lot::Mutex;

/// Decode bytes as ASCII, replacing anything outside the range with `?`.
#[must_use]
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
        .collect()
}

/// Ordered chunks of decoded text received since the buffer was last cleared.
#[derive(Debug, Default)]
pub struct ReceiveBuffer {
    chunks: Mutex<Vec<String>>,
}

impl ReceiveBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and append them as one chunk
    pub fn append(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let text = decode_ascii(bytes);
        self.chunks.lock().push(text);
    }

    /// Concatenated text, optionally clearing the buffer in the same step
    pub fn text(&self, clear: bool) -> String {
        let mut chunks = self.chunks.lock();
        let text = chunks.concat();
        if clear {
            chunks.clear();
        }
        text
    }

    /// The individual chunks, optionally clearing the buffer in the same step
    pub fn chunks(&self, clear: bool) -> Vec<String> {
        let mut chunks = self.chunks.lock();
        if clear {
            std::mem::take(&mut *chunks)
        } else {
            chunks.clone()
        }
    }

    /// Total number of buffered characters
    pub fn len(&self) -> usize {
        self.chunks.lock().iter().map(String::len).sum()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.chunks.lock().iter().all(String::is_empty)
    }

    /// Drop everything buffered
    pub fn clear(&self) {
        self.chunks.lock().clear();
    }
}
