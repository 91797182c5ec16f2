use chrono::{DateTime, Utc};

/// One decoded frame: the key, its JSON-compatible value and the time it
/// was extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    key: String,
    value: String,
    received_at: DateTime<Utc>,
}

impl RawMessage {
    /// Create a message stamped with the current time
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_received_at(key, value, Utc::now())
    }

    /// Create a message with an explicit timestamp
    pub fn with_received_at(
        key: impl Into<String>,
        value: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            received_at,
        }
    }

    /// Protocol key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Body text, with Python literals already rewritten to JSON
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// When the frame was extracted
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Parse the value as JSON
    ///
    /// # Errors
    ///
    /// Returns the parser error when the value is not valid JSON.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.value)
    }
}
