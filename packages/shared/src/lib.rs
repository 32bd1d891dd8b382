//! Code shared by the Belltower relay server and the terminal client.
//!
//! - `protocol`: wire events exchanged over the WebSocket
//! - `limits`: length limits shared by the relay and the client
//! - `logger`: tracing subscriber setup for both binaries
//! - `time`: clock abstraction and timestamp formatting

pub mod limits;
pub mod logger;
pub mod protocol;
pub mod time;
