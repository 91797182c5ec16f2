//! Typed access to the messages a worker reports.
//!
//! A [`Client`] keeps the latest raw message per key and turns it into a
//! Rust value on request. The [`TypeMap`] decides which key a type is read
//! from; types implement [`Message`] (scalar payloads) or
//! [`MessageCollection`] over [`MessageItem`]s (array payloads).
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
pub mod error;
pub mod message;
pub mod messages;
mod type_map;

pub use client::{Client, STANDARD_UPDATES};
pub use error::{Error, Result};
pub use message::{FieldMapping, Message, MessageCollection, MessageItem};
pub use type_map::{MessageShape, TypeEntry, TypeMap};
