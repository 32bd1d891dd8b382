//! WebSocket relay server: axum router, handlers and the relay core.

mod handler;
pub mod relay;
mod server;
mod signal;
pub mod state;

pub use relay::Relay;
pub use server::Server;
