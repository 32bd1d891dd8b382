//! Belltower terminal client.
//!
//! Walks the user through choosing a name and a room, relays typed messages
//! and raises a notification plus a ringing alarm for every message received
//! until the user acknowledges it.

pub mod alert;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod terminal;
mod ui;

pub use runner::{ClientOptions, run_client};
