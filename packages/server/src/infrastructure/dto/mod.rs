//! Data Transfer Objects (DTOs) for the HTTP inspection API.
//!
//! WebSocket wire events live in `belltower_shared::protocol`.

pub mod conversion;
pub mod http;
