//! UseCase: Room Broadcaster
//!
//! ルームのメンバーシップ管理と、ルーム内の全メンバー（送信者を含む）への
//! メッセージ配信を担当する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - join / leave / broadcast
//!
//! ### なぜこのテストが必要か
//! - 別ルームへの漏洩がないこと、送信者にもエコーされることを保証
//! - 再参加ポリシー（AlreadyInRoom で拒否）を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：同じルームの全員に一度ずつ届く
//! - エッジケース：メンバーのいないルームへの送信（何もしない）
//! - 異常系：二度目の参加

use std::sync::Arc;

use belltower_shared::{protocol::ServerEvent, time::now_millis};

use crate::domain::{
    ConnectionError, ConnectionId, DisplayName, Message, MessageBody, MessagePusher,
    RelayRepository, RepositoryError, RoomId, RoomRoster, Timestamp,
};

use super::error::JoinError;

/// 一回のブロードキャストの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub room_id: RoomId,
    /// 送信時点のメンバー数
    pub recipients: usize,
    /// 実際に送信チャンネルへ渡せた件数
    pub delivered: usize,
}

impl BroadcastReport {
    fn empty(room_id: RoomId) -> Self {
        Self {
            room_id,
            recipients: 0,
            delivered: 0,
        }
    }
}

/// Room Broadcaster
pub struct RoomBroadcaster {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RelayRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomBroadcaster {
    /// 新しい RoomBroadcaster を作成
    pub fn new(repository: Arc<dyn RelayRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 接続をルームに参加させる
    ///
    /// ルームが存在しなければ作成する。既にルームに割り当て済みの接続は
    /// `JoinError::AlreadyInRoom` で拒否する（再割り当てはしない）。
    pub async fn join(
        &self,
        id: &ConnectionId,
        room_id: RoomId,
        display_name: &DisplayName,
    ) -> Result<(), JoinError> {
        let created = self
            .repository
            .assign_room(id, room_id.clone(), Timestamp::new(now_millis()))
            .await
            .map_err(|e| match e {
                RepositoryError::Connection(ConnectionError::AlreadyInRoom(current)) => {
                    JoinError::AlreadyInRoom(current)
                }
                _ => JoinError::NotFound(id.to_string()),
            })?;

        if created {
            tracing::info!("Room '{}' created", room_id);
        }
        tracing::info!("User {} ({}) joined {}", id, display_name, room_id);
        Ok(())
    }

    /// 接続をルームから外す。割り当てが無ければ何もしない。
    pub async fn leave(&self, id: &ConnectionId) -> Option<RoomId> {
        let left = self.repository.release_room(id).await;
        if let Some(room_id) = &left {
            tracing::info!("Connection {} left {}", id, room_id);
        }
        left
    }

    /// 現在存在するルームのスナップショット（ルーム ID 順）
    pub async fn rooms(&self) -> Vec<RoomRoster> {
        self.repository.list_rosters().await
    }

    /// ルームの全メンバー（送信者を含む）にメッセージを配信
    ///
    /// 送信者名は登録済みの表示名を優先し、未登録の場合のみ `claimed_name` を使う。
    /// 送信者がルームのメンバーかどうかはここでは検証しない。
    pub async fn broadcast(
        &self,
        sender_id: &ConnectionId,
        room_id: &RoomId,
        body: MessageBody,
        claimed_name: Option<DisplayName>,
    ) -> BroadcastReport {
        let recorded_name = self
            .repository
            .get_connection(sender_id)
            .await
            .and_then(|connection| connection.display_name);
        let Some(sender_name) = recorded_name.or(claimed_name) else {
            tracing::warn!(
                "Dropping message from {}: sender has no display name",
                sender_id
            );
            return BroadcastReport::empty(room_id.clone());
        };

        let message = Message::new(sender_name, room_id.clone(), body);

        // メンバー集合のスナップショット
        let targets = self.repository.room_members(&message.room).await;
        if targets.is_empty() {
            tracing::debug!(
                "Room '{}' has no members, message from {} dropped",
                message.room,
                message.sender
            );
            return BroadcastReport::empty(message.room);
        }

        let event = ServerEvent::receive_message(message.sender.as_str(), message.body.as_str());
        let payload = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode receive_message: {}", e);
                return BroadcastReport::empty(message.room);
            }
        };

        let delivered = self.message_pusher.broadcast(&targets, &payload).await;
        tracing::info!(
            "Broadcast from '{}' to room '{}': {}/{} delivered",
            message.sender,
            message.room,
            delivered,
            targets.len()
        );

        BroadcastReport {
            room_id: message.room,
            recipients: targets.len(),
            delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, PusherChannel, message_pusher::MockMessagePusher},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRelayRepository,
        },
    };
    use tokio::sync::mpsc;

    struct Fixture {
        repository: Arc<InMemoryRelayRepository>,
        pusher: Arc<WebSocketMessagePusher>,
        broadcaster: RoomBroadcaster,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryRelayRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let broadcaster = RoomBroadcaster::new(repository.clone(), pusher.clone());
        Fixture {
            repository,
            pusher,
            broadcaster,
        }
    }

    fn name(value: &str) -> DisplayName {
        DisplayName::new(value).unwrap()
    }

    fn room(value: &str) -> RoomId {
        RoomId::new(value).unwrap()
    }

    fn body(value: &str) -> MessageBody {
        MessageBody::new(value).unwrap()
    }

    /// 接続を登録し、表示名を設定してルームに参加させる
    async fn joined(
        fx: &Fixture,
        display_name: &str,
        room_name: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let id = ConnectionId::generate();
        let (tx, rx): (PusherChannel, _) = mpsc::unbounded_channel();
        fx.repository
            .insert_connection(Connection::new(id, Timestamp::new(now_millis())))
            .await
            .unwrap();
        fx.repository
            .set_display_name(&id, name(display_name))
            .await
            .unwrap();
        fx.pusher.register_client(id, tx).await;
        fx.broadcaster
            .join(&id, room(room_name), &name(display_name))
            .await
            .unwrap();
        (id, rx)
    }

    fn receive_message_json(username: &str, message: &str) -> String {
        ServerEvent::receive_message(username, message)
            .to_json()
            .unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_members_including_sender() {
        // テスト項目: Alice と Bob が room1 にいて Bob が "hi" を送ると二人とも受信する
        // given (前提条件):
        let fx = fixture();
        let (_alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;
        let (bob, mut bob_rx) = joined(&fx, "Bob", "room1").await;

        // when (操作):
        let report = fx
            .broadcaster
            .broadcast(&bob, &room("room1"), body("hi"), None)
            .await;

        // then (期待する結果):
        assert_eq!(report.recipients, 2);
        assert_eq!(report.delivered, 2);
        let expected = receive_message_json("Bob", "hi");
        assert_eq!(alice_rx.recv().await, Some(expected.clone()));
        assert_eq!(bob_rx.recv().await, Some(expected));
    }

    #[tokio::test]
    async fn test_broadcast_does_not_leak_to_other_rooms() {
        // テスト項目: room1 への送信は room2 のメンバーに届かない
        // given (前提条件):
        let fx = fixture();
        let (alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;
        let (_bob, mut bob_rx) = joined(&fx, "Bob", "room2").await;

        // when (操作):
        fx.broadcaster
            .broadcast(&alice, &room("room1"), body("only room1"), None)
            .await;

        // then (期待する結果):
        assert!(alice_rx.recv().await.is_some());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_delivers_exactly_once_per_member() {
        // テスト項目: 一回のブロードキャストで各メンバーに一度だけ届く
        // given (前提条件):
        let fx = fixture();
        let (alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;

        // when (操作):
        fx.broadcaster
            .broadcast(&alice, &room("room1"), body("once"), None)
            .await;

        // then (期待する結果):
        assert!(alice_rx.recv().await.is_some());
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room_is_noop() {
        // テスト項目: メンバーのいないルームへの送信は何もしない（エラーにならない）
        // given (前提条件):
        let fx = fixture();
        let (alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;

        // when (操作):
        let report = fx
            .broadcaster
            .broadcast(&alice, &room("nowhere"), body("hello?"), None)
            .await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::empty(room("nowhere")));
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_is_not_restricted_to_members() {
        // テスト項目: 送信者がルームのメンバーでなくても配信される（Broadcaster は検証しない）
        // given (前提条件):
        let fx = fixture();
        let (alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;
        let (_bob, mut bob_rx) = joined(&fx, "Bob", "room2").await;

        // when (操作):
        let report = fx
            .broadcaster
            .broadcast(&alice, &room("room2"), body("knock knock"), None)
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(
            bob_rx.recv().await,
            Some(receive_message_json("Alice", "knock knock"))
        );
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_prefers_recorded_display_name() {
        // テスト項目: 送信者名は申告された名前ではなく登録済みの表示名が使われる
        // given (前提条件):
        let fx = fixture();
        let (alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;

        // when (操作):
        fx.broadcaster
            .broadcast(&alice, &room("room1"), body("hi"), Some(name("Mallory")))
            .await;

        // then (期待する結果):
        assert_eq!(
            alice_rx.recv().await,
            Some(receive_message_json("Alice", "hi"))
        );
    }

    #[tokio::test]
    async fn test_broadcast_falls_back_to_claimed_name() {
        // テスト項目: 未参加の送信者は申告された名前で配信される
        // given (前提条件):
        let fx = fixture();
        let (_alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;
        let stranger = ConnectionId::generate();

        // when (操作):
        fx.broadcaster
            .broadcast(&stranger, &room("room1"), body("hey"), Some(name("Stranger")))
            .await;

        // then (期待する結果):
        assert_eq!(
            alice_rx.recv().await,
            Some(receive_message_json("Stranger", "hey"))
        );
    }

    #[tokio::test]
    async fn test_broadcast_without_any_name_is_dropped() {
        // テスト項目: 送信者名が一切分からないメッセージは破棄される
        // given (前提条件):
        let fx = fixture();
        let (_alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;
        let stranger = ConnectionId::generate();

        // when (操作):
        let report = fx
            .broadcaster
            .broadcast(&stranger, &room("room1"), body("hey"), None)
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 0);
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_twice_is_rejected() {
        // テスト項目: 二度目の参加は AlreadyInRoom で拒否され、元のルームに残る
        // given (前提条件):
        let fx = fixture();
        let (alice, _alice_rx) = joined(&fx, "Alice", "room1").await;

        // when (操作):
        let result = fx
            .broadcaster
            .join(&alice, room("room2"), &name("Alice"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::AlreadyInRoom("room1".to_string())));
        assert_eq!(fx.repository.room_members(&room("room1")).await, vec![alice]);
        assert!(fx.repository.room_members(&room("room2")).await.is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_connection() {
        // テスト項目: 登録されていない接続の参加は NotFound になる
        // given (前提条件):
        let fx = fixture();
        let ghost = ConnectionId::generate();

        // when (操作):
        let result = fx.broadcaster.join(&ghost, room("room1"), &name("Ghost")).await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::NotFound(ghost.to_string())));
    }

    #[tokio::test]
    async fn test_leave_stops_delivery() {
        // テスト項目: ルームを抜けた接続には以降のメッセージが届かない
        // given (前提条件):
        let fx = fixture();
        let (alice, mut alice_rx) = joined(&fx, "Alice", "room1").await;
        let (bob, _bob_rx) = joined(&fx, "Bob", "room1").await;

        // when (操作):
        let left = fx.broadcaster.leave(&alice).await;
        let again = fx.broadcaster.leave(&alice).await;
        fx.broadcaster
            .broadcast(&bob, &room("room1"), body("bye"), None)
            .await;

        // then (期待する結果):
        assert_eq!(left, Some(room("room1")));
        assert_eq!(again, None);
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_hands_snapshot_to_pusher() {
        // テスト項目: メンバーのスナップショットと receive_message の JSON が MessagePusher に渡される
        // given (前提条件):
        let repository = Arc::new(InMemoryRelayRepository::new());
        let alice = ConnectionId::generate();
        repository
            .insert_connection(Connection::new(alice, Timestamp::new(1)))
            .await
            .unwrap();
        repository
            .set_display_name(&alice, name("Alice"))
            .await
            .unwrap();
        repository
            .assign_room(&alice, room("room1"), Timestamp::new(1))
            .await
            .unwrap();

        let expected_json = receive_message_json("Alice", "hi");
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(move |targets, content| targets == [alice] && content == expected_json)
            .times(1)
            .returning(|targets, _| targets.len());
        let broadcaster = RoomBroadcaster::new(repository, Arc::new(pusher));

        // when (操作):
        let report = broadcaster
            .broadcast(&alice, &room("room1"), body("hi"), None)
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
    }
}
