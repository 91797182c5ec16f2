use crate::error::Result;
use crate::message::{Message, from_json};

use serde::Deserialize;

/// Periodic liveness counter sent under `heartbeat`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Heartbeat {
    /// Counter value
    pub value: i64,
}

impl Message for Heartbeat {
    fn fill(&mut self, value: &str) -> Result<()> {
        *self = from_json(value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_fill() {
        let mut heartbeat = Heartbeat::default();
        heartbeat.fill("42").unwrap();
        assert_eq!(heartbeat.value, 42);
    }

    #[test]
    fn test_fill_rejects_non_integer() {
        let mut heartbeat = Heartbeat::default();
        let err = heartbeat.fill("\"soon\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization {
                type_name: "Heartbeat",
                ..
            }
        ));
    }
}
