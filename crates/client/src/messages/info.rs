use crate::error::{Error, Result};
use crate::message::{Message, short_type_name};

use serde_json::Value;

/// One titled group of name/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoSection {
    /// Section title, e.g. `System`
    pub title: String,
    /// Entries in the order sent
    pub entries: Vec<(String, String)>,
}

impl InfoSection {
    /// Value of the first entry named `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Client and host description sent under `info`.
///
/// On the wire each section is an array whose first element is the title
/// and whose remaining elements are `[name, value]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Info {
    /// Sections in the order sent
    pub sections: Vec<InfoSection>,
}

impl Info {
    /// Section titled `title`
    #[must_use]
    pub fn section(&self, title: &str) -> Option<&InfoSection> {
        self.sections.iter().find(|section| section.title == title)
    }

    /// Value of `name` in section `title`
    #[must_use]
    pub fn get(&self, title: &str, name: &str) -> Option<&str> {
        self.section(title)?.get(name)
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

impl Message for Info {
    fn fill(&mut self, value: &str) -> Result<()> {
        let raw: Vec<Vec<Value>> =
            serde_json::from_str(value).map_err(|source| Error::Deserialization {
                type_name: short_type_name::<Self>(),
                source,
            })?;
        let shape = |detail: String| Error::shape(short_type_name::<Self>(), detail);

        self.sections.clear();
        for section in raw {
            let mut elements = section.into_iter();
            let title = elements
                .next()
                .as_ref()
                .and_then(Value::as_str)
                .ok_or_else(|| shape("section without a title".to_string()))?
                .to_string();

            let mut entries = Vec::new();
            for element in elements {
                let pair = match element.as_array().map(Vec::as_slice) {
                    Some([name, value]) => name.as_str().zip(text(value)),
                    _ => None,
                };
                let (name, value) =
                    pair.ok_or_else(|| shape(format!("bad entry {element} in '{title}'")))?;
                entries.push((name.to_string(), value));
            }

            self.sections.push(InfoSection { title, entries });
        }

        Ok(())
    }
}
