use crate::message::{Message, MessageCollection, MessageItem, short_type_name};
use crate::messages::{Heartbeat, Info, Options, Slot, SlotCollection, Unit, UnitCollection};

use pyon_messages::KeyTypeResolver;
use std::any::TypeId;

/// Whether a key carries one object or a list of items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageShape {
    /// One value
    Scalar,
    /// An array of items
    Collection,
}

/// One key ↔ type registration
#[derive(Debug, Clone)]
pub struct TypeEntry {
    key: String,
    type_id: TypeId,
    type_name: &'static str,
    shape: MessageShape,
}

impl TypeEntry {
    /// Protocol key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Registered type name
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Payload shape
    #[must_use]
    pub const fn shape(&self) -> MessageShape {
        self.shape
    }
}

/// Maps message types to the protocol keys they are read from.
///
/// The map is built once and shared immutably. Lookups scan the few
/// registered entries in order.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    entries: Vec<TypeEntry>,
}

impl TypeMap {
    /// Create an empty map
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The built-in message types under their worker keys
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_message::<Heartbeat>("heartbeat")
            .with_message::<Info>("info")
            .with_message::<Options>("options")
            .with_collection::<SlotCollection, Slot>("slots")
            .with_collection::<UnitCollection, Unit>("units")
    }

    /// Register a scalar message type
    #[must_use]
    pub fn with_message<T: Message>(self, key: impl Into<String>) -> Self {
        self.register::<T>(key.into(), MessageShape::Scalar)
    }

    /// Register a collection message type
    #[must_use]
    pub fn with_collection<C, I>(self, key: impl Into<String>) -> Self
    where
        C: MessageCollection<I>,
        I: MessageItem,
    {
        self.register::<C>(key.into(), MessageShape::Collection)
    }

    fn register<T: 'static>(mut self, key: String, shape: MessageShape) -> Self {
        let type_id = TypeId::of::<T>();
        self.entries.retain(|entry| entry.type_id != type_id);
        self.entries.push(TypeEntry {
            key,
            type_id,
            type_name: short_type_name::<T>(),
            shape,
        });
        self
    }

    /// Entry for `T`, falling back to the entry of `T::base_type()`
    #[must_use]
    pub fn resolve<T: Message>(&self) -> Option<&TypeEntry> {
        self.find(TypeId::of::<T>())
            .or_else(|| T::base_type().and_then(|base| self.find(base)))
    }

    fn find(&self, type_id: TypeId) -> Option<&TypeEntry> {
        self.entries.iter().find(|entry| entry.type_id == type_id)
    }

    /// Entry registered for `key`
    #[must_use]
    pub fn entry_for_key(&self, key: &str) -> Option<&TypeEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Registered entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.iter()
    }

    /// Number of registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyTypeResolver for TypeMap {
    fn type_name_for(&self, key: &str) -> Option<&'static str> {
        self.entry_for_key(key).map(TypeEntry::type_name)
    }
}
