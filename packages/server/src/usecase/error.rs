//! UseCase 層のエラー定義

use thiserror::Error;

/// Connection Registry のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 状態遷移として許されない操作（空の表示名、二度目の表示名設定など）
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 接続が存在しない
    #[error("Connection '{0}' not found")]
    NotFound(String),
}

/// ルーム参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// 既にルームに割り当て済み
    #[error("Connection is already in room '{0}'")]
    AlreadyInRoom(String),

    /// 接続が存在しない
    #[error("Connection '{0}' not found")]
    NotFound(String),
}

/// ルーム参照のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomQueryError {
    /// ルームが存在しない（メンバーがいない）
    #[error("Room '{0}' not found")]
    RoomNotFound(String),
}
