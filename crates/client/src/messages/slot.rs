use crate::error::Result;
use crate::message::{
    FieldMapping, Message, MessageCollection, MessageItem, fill_collection, set_bool, set_string,
};

use serde_json::Value;
use std::collections::BTreeMap;

/// One compute slot as reported under `slots`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    /// Slot identifier, e.g. `00`
    pub id: String,
    /// Run status, e.g. `RUNNING`
    pub status: String,
    /// Hardware description, e.g. `cpu:7`
    pub description: String,
    /// Why the slot is not running, if it is not
    pub reason: String,
    /// Whether the slot only runs while the machine is idle
    pub idle: bool,
    /// Per-slot option overrides
    pub options: BTreeMap<String, String>,
}

fn set_options(target: &mut BTreeMap<String, String>, value: &Value) -> bool {
    let Value::Object(object) = value else {
        return false;
    };

    target.clear();
    for (name, value) in object {
        let mut text = String::new();
        let ok = match value {
            Value::Bool(b) => {
                text = b.to_string();
                true
            }
            other => set_string(&mut text, other),
        };
        if !ok {
            return false;
        }
        target.insert(name.clone(), text);
    }
    true
}

impl MessageItem for Slot {
    const FIELDS: &'static [FieldMapping<Self>] = &[
        FieldMapping {
            name: "id",
            set: |slot, v| set_string(&mut slot.id, v),
        },
        FieldMapping {
            name: "status",
            set: |slot, v| set_string(&mut slot.status, v),
        },
        FieldMapping {
            name: "description",
            set: |slot, v| set_string(&mut slot.description, v),
        },
        FieldMapping {
            name: "reason",
            set: |slot, v| set_string(&mut slot.reason, v),
        },
        FieldMapping {
            name: "idle",
            set: |slot, v| set_bool(&mut slot.idle, v),
        },
        FieldMapping {
            name: "options",
            set: |slot, v| set_options(&mut slot.options, v),
        },
    ];
}

/// All slots, in the order sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCollection {
    /// The slots
    pub slots: Vec<Slot>,
}

impl SlotCollection {
    /// Slot with identifier `id`
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Message for SlotCollection {
    fn fill(&mut self, value: &str) -> Result<()> {
        self.slots.clear();
        fill_collection::<Self, Slot>(self, value)
    }
}

impl MessageCollection<Slot> for SlotCollection {
    fn push(&mut self, item: Slot) {
        self.slots.push(item);
    }
}
