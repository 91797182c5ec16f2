//! PyON message framing and caching.
//!
//! [`MessageConnection`] runs a [`Framer`] on every receive-loop tick of a
//! [`pyon_connection::Connection`]. Each complete `PyON 1 <key>` frame is
//! stored in a [`MessageCache`] under its key, replacing the previous one.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod cache;
mod connection;
pub mod error;
pub mod frame;
mod framer;
mod message;

pub use cache::MessageCache;
pub use connection::MessageConnection;
pub use error::{Error, Result};
pub use frame::{HEADER, extract_next_frame};
pub use framer::{Framer, KeyTypeResolver};
pub use message::RawMessage;
