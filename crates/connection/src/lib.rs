//! Text connection to a Folding@home-style worker.
//!
//! A [`Connection`] opens a transport, optionally authenticates, and runs a
//! background receive loop that drains incoming bytes into an ASCII text
//! buffer. Lifecycle, traffic and failures are reported on an [`EventBus`].
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod buffer;
pub mod config;
mod connection;
pub mod error;
pub mod events;
mod state;

pub use buffer::{ReceiveBuffer, decode_ascii};
pub use config::ConnectionConfig;
pub use connection::{Connection, UpdateHandler};
pub use error::{Error, Result};
pub use events::{ConnectionEvent, EventBus, StatusLevel};
pub use state::ConnectionState;
