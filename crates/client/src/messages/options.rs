use crate::error::Result;
use crate::message::{Message, from_json};

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Worker configuration options sent under `options`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Options {
    /// Option values by name
    pub values: BTreeMap<String, Value>,
}

impl Options {
    /// Value of `name` as text; numbers and booleans are rendered
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        match self.values.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl Message for Options {
    fn fill(&mut self, value: &str) -> Result<()> {
        *self = from_json(value)?;
        Ok(())
    }
}
