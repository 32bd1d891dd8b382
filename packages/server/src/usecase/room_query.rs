//! UseCase: ルーム情報の参照
//!
//! HTTP の参照 API 向けに、ルームとメンバーの読み取り専用ビューを返す。

use std::sync::Arc;

use crate::domain::{RoomId, RoomRoster};

use super::{broadcaster::RoomBroadcaster, error::RoomQueryError};

/// ルーム参照のユースケース
pub struct RoomQueryUseCase {
    broadcaster: Arc<RoomBroadcaster>,
}

impl RoomQueryUseCase {
    /// 新しい RoomQueryUseCase を作成
    pub fn new(broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self { broadcaster }
    }

    /// 現在存在する全ルームを取得（ルーム ID 順）
    pub async fn list_rooms(&self) -> Vec<RoomRoster> {
        self.broadcaster.rooms().await
    }

    /// 指定ルームの詳細を取得
    pub async fn room_detail(&self, room_id: &str) -> Result<RoomRoster, RoomQueryError> {
        let room_id =
            RoomId::new(room_id).map_err(|_| RoomQueryError::RoomNotFound(room_id.to_string()))?;

        self.broadcaster
            .rooms()
            .await
            .into_iter()
            .find(|roster| roster.id == room_id)
            .ok_or_else(|| RoomQueryError::RoomNotFound(room_id.into_string()))
    }
}
