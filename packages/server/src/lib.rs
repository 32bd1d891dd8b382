//! Belltower relay server library.
//!
//! Accepts WebSocket connections, assigns each one to a named room and relays
//! chat messages to every member of the addressed room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
