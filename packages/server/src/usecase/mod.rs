//! UseCase 層
//!
//! Domain の trait（Repository, MessagePusher）にのみ依存し、
//! 接続管理・ルーム参加・配信のアプリケーションロジックを提供する。

pub mod broadcaster;
pub mod error;
pub mod registry;
pub mod room_query;

pub use broadcaster::{BroadcastReport, RoomBroadcaster};
pub use error::{JoinError, RegistryError, RoomQueryError};
pub use registry::ConnectionRegistry;
pub use room_query::RoomQueryUseCase;
