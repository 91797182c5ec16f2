//! Built-in message types for the worker's standard keys.

mod heartbeat;
mod info;
mod options;
mod slot;
mod unit;

pub use heartbeat::Heartbeat;
pub use info::{Info, InfoSection};
pub use options::Options;
pub use slot::{Slot, SlotCollection};
pub use unit::{Unit, UnitCollection};
