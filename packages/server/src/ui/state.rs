//! Shared axum state.

use std::sync::Arc;

use crate::usecase::RoomQueryUseCase;

use super::relay::Relay;

/// Shared application state
pub struct AppState {
    /// Relay（WebSocket イベントのルーティング）
    pub relay: Arc<Relay>,
    /// RoomQueryUseCase（ルーム参照のユースケース）
    pub room_query: Arc<RoomQueryUseCase>,
}
