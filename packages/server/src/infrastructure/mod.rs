//! Infrastructure layer: concrete implementations of the domain traits and
//! the DTOs exposed over HTTP.

pub mod dto;
pub mod message_pusher;
pub mod repository;
