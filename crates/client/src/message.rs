//! Traits implemented by typed messages.

use crate::error::{Error, Result};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::TypeId;

/// Short name of `T`, without its module path
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

/// A typed view of one protocol message.
///
/// Instances are created with `Default` and then filled from the cached
/// value text.
pub trait Message: Default + Send + 'static {
    /// Populate `self` from a JSON value
    ///
    /// # Errors
    ///
    /// `Deserialization` or `UnexpectedShape` when `value` does not fit.
    fn fill(&mut self, value: &str) -> Result<()>;

    /// Type whose protocol key this type shares when it has none of its own
    fn base_type() -> Option<TypeId> {
        None
    }
}

/// Parse `value` with serde, attributing failures to `T`
///
/// # Errors
///
/// `Deserialization` when `value` does not parse as `T`.
pub fn from_json<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|source| Error::Deserialization {
        type_name: short_type_name::<T>(),
        source,
    })
}

/// Setter for one named field of a collection item
pub struct FieldMapping<T> {
    /// JSON object key
    pub name: &'static str,
    /// Store the JSON value into the item; `false` when the value has the
    /// wrong type
    pub set: fn(&mut T, &Value) -> bool,
}

/// One element of a list-shaped message, populated from an explicit
/// field table.
pub trait MessageItem: Default + Send + 'static {
    /// Field table; object keys not listed are ignored
    const FIELDS: &'static [FieldMapping<Self>];

    /// Build an item from a JSON object
    ///
    /// # Errors
    ///
    /// `UnexpectedShape` when `value` is not an object or a listed field has
    /// the wrong type.
    fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(Error::shape(short_type_name::<Self>(), "expected an object"));
        };

        let mut item = Self::default();
        for field in Self::FIELDS {
            if let Some(value) = object.get(field.name) {
                if !(field.set)(&mut item, value) {
                    return Err(Error::shape(
                        short_type_name::<Self>(),
                        format!("field '{}' has unexpected value {value}", field.name),
                    ));
                }
            }
        }

        Ok(item)
    }
}

/// A list-shaped message made of `I` items
pub trait MessageCollection<I: MessageItem>: Message {
    /// Append one item
    fn push(&mut self, item: I);
}

/// Fill a collection from an array-shaped value
///
/// # Errors
///
/// `Deserialization` when `value` is not JSON, `UnexpectedShape` when it is
/// not an array or an element does not fit `I`.
pub fn fill_collection<C, I>(collection: &mut C, value: &str) -> Result<()>
where
    C: MessageCollection<I>,
    I: MessageItem,
{
    let parsed: Value = serde_json::from_str(value).map_err(|source| Error::Deserialization {
        type_name: short_type_name::<C>(),
        source,
    })?;

    let Value::Array(elements) = parsed else {
        return Err(Error::shape(short_type_name::<C>(), "expected an array"));
    };

    for element in &elements {
        collection.push(I::from_value(element)?);
    }

    Ok(())
}

/// Store a string, or the text of a number; `null` clears the target
pub fn set_string(target: &mut String, value: &Value) -> bool {
    match value {
        Value::String(s) => s.clone_into(target),
        Value::Number(n) => *target = n.to_string(),
        Value::Null => target.clear(),
        _ => return false,
    }
    true
}

/// Store an unsigned integer given as a number or a numeric string
pub fn set_u64(target: &mut u64, value: &Value) -> bool {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    match parsed {
        Some(v) => {
            *target = v;
            true
        }
        None => false,
    }
}

/// Store a `u32` given as a number or a numeric string
pub fn set_u32(target: &mut u32, value: &Value) -> bool {
    let mut wide = 0;
    if !set_u64(&mut wide, value) {
        return false;
    }
    match u32::try_from(wide) {
        Ok(v) => {
            *target = v;
            true
        }
        Err(_) => false,
    }
}

/// Store a boolean given as a bool or as `"true"`/`"false"`
pub fn set_bool(target: &mut bool, value: &Value) -> bool {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    if let Some(v) = parsed {
        *target = v;
    }
    parsed.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct Item {
        name: String,
        count: u32,
    }

    impl MessageItem for Item {
        const FIELDS: &'static [FieldMapping<Self>] = &[
            FieldMapping {
                name: "name",
                set: |item, v| set_string(&mut item.name, v),
            },
            FieldMapping {
                name: "count",
                set: |item, v| set_u32(&mut item.count, v),
            },
        ];
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Item>(), "Item");
        assert_eq!(short_type_name::<Vec<Item>>(), "Vec");
    }

    #[test]
    fn test_item_from_value() {
        let item = Item::from_value(&json!({"name": "cpu", "count": "4", "extra": true})).unwrap();
        assert_eq!(
            item,
            Item {
                name: "cpu".to_string(),
                count: 4
            }
        );

        let item = Item::from_value(&json!({})).unwrap();
        assert_eq!(item, Item::default());
    }

    #[test]
    fn test_item_field_mismatch() {
        let err = Item::from_value(&json!({"count": [1]})).unwrap_err();
        assert!(matches!(err, Error::UnexpectedShape { type_name: "Item", .. }));

        let err = Item::from_value(&json!([])).unwrap_err();
        assert!(matches!(err, Error::UnexpectedShape { .. }));
    }

    #[test]
    fn test_setters() {
        let mut s = String::from("old");
        assert!(set_string(&mut s, &json!(12)));
        assert_eq!(s, "12");
        assert!(set_string(&mut s, &Value::Null));
        assert!(s.is_empty());
        assert!(!set_string(&mut s, &json!({})));

        let mut n = 0u32;
        assert!(!set_u32(&mut n, &json!(u64::MAX)));
        assert!(!set_u32(&mut n, &json!(-1)));
        assert!(set_u32(&mut n, &json!(" 7 ")));
        assert_eq!(n, 7);

        let mut b = false;
        assert!(set_bool(&mut b, &json!("true")));
        assert!(b);
        assert!(!set_bool(&mut b, &json!(1)));
    }
}
