//! Relay core: routes decoded client events to the registry and the broadcaster.
//!
//! Socket handling lives in `handler::websocket`; this type only sees text
//! frames and connection ids, so the routing can be exercised without sockets.

use std::sync::Arc;

use belltower_shared::protocol::{ClientEvent, ErrorCode, JoinRoomPayload, SendMessagePayload, ServerEvent};

use crate::{
    config::RelayConfig,
    domain::{
        Connection, ConnectionId, DisplayName, MessageBody, MessagePusher, PusherChannel, RoomId,
    },
    usecase::{ConnectionRegistry, JoinError, RegistryError, RoomBroadcaster},
};

/// Process-wide relay service, shared through the axum state.
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<RoomBroadcaster>,
    message_pusher: Arc<dyn MessagePusher>,
    config: RelayConfig,
}

impl Relay {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        broadcaster: Arc<RoomBroadcaster>,
        message_pusher: Arc<dyn MessagePusher>,
        config: RelayConfig,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            message_pusher,
            config,
        }
    }

    /// Register a freshly accepted connection together with its outbound channel.
    pub async fn connect(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        self.registry.register(sender).await
    }

    /// Decode one inbound text frame and route it.
    ///
    /// Frames that fail to decode are logged and dropped; the connection stays open.
    pub async fn handle_text(&self, id: &ConnectionId, text: &str) {
        match ClientEvent::from_json(text) {
            Ok(event) => self.handle_event(id, event).await,
            Err(e) => {
                tracing::warn!("Dropping malformed frame from {}: {}", id, e);
            }
        }
    }

    /// Route one decoded client event.
    pub async fn handle_event(&self, id: &ConnectionId, event: ClientEvent) {
        tracing::debug!("Received '{}' from {}", event.name(), id);
        match event {
            ClientEvent::JoinRoom(payload) => self.join_room(id, payload).await,
            ClientEvent::SendMessage(payload) => self.send_message(id, payload).await,
        }
    }

    /// Tear down a connection. Safe to call more than once.
    pub async fn disconnect(&self, id: &ConnectionId) -> Option<Connection> {
        self.registry.unregister(id).await
    }

    async fn join_room(&self, id: &ConnectionId, payload: JoinRoomPayload) {
        let room_id = match RoomId::new(&payload.room_name) {
            Ok(room_id) => room_id,
            Err(e) => {
                self.reply_error(id, ErrorCode::InvalidRoom, e.to_string()).await;
                return;
            }
        };

        let Some(connection) = self.registry.connection(id).await else {
            tracing::warn!("join_room from unknown connection {}", id);
            return;
        };
        if let Some(current) = &connection.room {
            self.reply_error(
                id,
                ErrorCode::AlreadyInRoom,
                format!("already in room '{}'", current),
            )
            .await;
            return;
        }

        // A name recorded by an earlier, unacknowledged join attempt is kept.
        let display_name = match connection.display_name {
            Some(name) => name,
            None => match self.registry.set_identity(id, &payload.username).await {
                Ok(name) => name,
                Err(RegistryError::InvalidState(reason)) => {
                    self.reply_error(id, ErrorCode::InvalidState, reason).await;
                    return;
                }
                Err(RegistryError::NotFound(_)) => {
                    tracing::warn!("Connection {} vanished while joining", id);
                    return;
                }
            },
        };

        match self.broadcaster.join(id, room_id.clone(), &display_name).await {
            Ok(()) => {
                self.reply(id, ServerEvent::room_joined(room_id.as_str())).await;
            }
            Err(JoinError::AlreadyInRoom(current)) => {
                self.reply_error(
                    id,
                    ErrorCode::AlreadyInRoom,
                    format!("already in room '{}'", current),
                )
                .await;
            }
            Err(JoinError::NotFound(_)) => {
                tracing::warn!("Connection {} vanished while joining", id);
            }
        }
    }

    async fn send_message(&self, id: &ConnectionId, payload: SendMessagePayload) {
        let room_id = match RoomId::new(&payload.room_name) {
            Ok(room_id) => room_id,
            Err(e) => {
                tracing::warn!("Dropping send_message from {}: {}", id, e);
                return;
            }
        };
        let body = match MessageBody::new(payload.message) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Dropping send_message from {}: {}", id, e);
                return;
            }
        };

        if self.config.require_membership {
            let member = self
                .registry
                .connection(id)
                .await
                .is_some_and(|connection| connection.is_in_room(&room_id));
            if !member {
                tracing::warn!(
                    "Dropping send_message from {}: not a member of '{}'",
                    id,
                    room_id
                );
                self.reply_error(
                    id,
                    ErrorCode::NotInRoom,
                    format!("not a member of room '{}'", room_id),
                )
                .await;
                return;
            }
        }

        let claimed_name = DisplayName::new(&payload.username).ok();
        self.broadcaster
            .broadcast(id, &room_id, body, claimed_name)
            .await;
    }

    async fn reply_error(&self, id: &ConnectionId, code: ErrorCode, message: String) {
        tracing::debug!("Replying {:?} to {}: {}", code, id, message);
        self.reply(id, ServerEvent::error(code, message)).await;
    }

    async fn reply(&self, id: &ConnectionId, event: ServerEvent) {
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode reply for {}: {}", id, e);
                return;
            }
        };
        if let Err(e) = self.message_pusher.push_to(id, &json).await {
            tracing::warn!("Failed to reply to {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::RelayRepository,
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRelayRepository,
        },
    };
    use belltower_shared::protocol::ErrorPayload;
    use tokio::sync::mpsc;

    struct Fixture {
        repository: Arc<InMemoryRelayRepository>,
        relay: Relay,
    }

    fn fixture(config: RelayConfig) -> Fixture {
        let repository = Arc::new(InMemoryRelayRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let broadcaster = Arc::new(RoomBroadcaster::new(repository.clone(), pusher.clone()));
        let registry = Arc::new(ConnectionRegistry::new(
            repository.clone(),
            pusher.clone(),
            broadcaster.clone(),
        ));
        Fixture {
            repository,
            relay: Relay::new(registry, broadcaster, pusher, config),
        }
    }

    async fn connect(fx: &Fixture) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = fx.relay.connect(tx).await.unwrap();
        (id, rx)
    }

    async fn join(
        fx: &Fixture,
        username: &str,
        room_name: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (id, mut rx) = connect(fx).await;
        fx.relay
            .handle_event(&id, ClientEvent::join_room(room_name, username))
            .await;
        let ack = ServerEvent::from_json(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(ack, ServerEvent::room_joined(room_name));
        (id, rx)
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<String>) -> Option<ServerEvent> {
        rx.try_recv()
            .ok()
            .map(|json| ServerEvent::from_json(&json).unwrap())
    }

    fn error_code(event: Option<ServerEvent>) -> Option<ErrorCode> {
        match event {
            Some(ServerEvent::Error(ErrorPayload { code, .. })) => Some(code),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_join_then_send_reaches_whole_room() {
        // テスト項目: Alice と Bob が room1 に参加し、Bob の "hi" が二人に届く
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (_alice, mut alice_rx) = join(&fx, "Alice", "room1").await;
        let (bob, mut bob_rx) = join(&fx, "Bob", "room1").await;

        // when (操作):
        fx.relay
            .handle_event(&bob, ClientEvent::send_message("room1", "Bob", "hi"))
            .await;

        // then (期待する結果):
        let expected = Some(ServerEvent::receive_message("Bob", "hi"));
        assert_eq!(next_event(&mut alice_rx), expected);
        assert_eq!(next_event(&mut bob_rx), expected);
    }

    #[tokio::test]
    async fn test_rejoin_is_rejected_with_error_event() {
        // テスト項目: 参加済みの接続からの join_room は already_in_room で拒否される
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (alice, mut alice_rx) = join(&fx, "Alice", "room1").await;

        // when (操作):
        fx.relay
            .handle_event(&alice, ClientEvent::join_room("room2", "Alice"))
            .await;

        // then (期待する結果):
        assert_eq!(error_code(next_event(&mut alice_rx)), Some(ErrorCode::AlreadyInRoom));
        let connection = fx.repository.get_connection(&alice).await.unwrap();
        assert_eq!(connection.room.unwrap().as_str(), "room1");
    }

    #[tokio::test]
    async fn test_join_with_blank_room_is_invalid_room() {
        // テスト項目: 空のルーム名での参加は invalid_room で、状態は変わらない
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (id, mut rx) = connect(&fx).await;

        // when (操作):
        fx.relay
            .handle_event(&id, ClientEvent::join_room("   ", "Alice"))
            .await;

        // then (期待する結果):
        assert_eq!(error_code(next_event(&mut rx)), Some(ErrorCode::InvalidRoom));
        let connection = fx.repository.get_connection(&id).await.unwrap();
        assert!(connection.display_name.is_none());
        assert!(connection.room.is_none());
    }

    #[tokio::test]
    async fn test_join_with_blank_name_is_invalid_state() {
        // テスト項目: 空の表示名での参加は invalid_state
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (id, mut rx) = connect(&fx).await;

        // when (操作):
        fx.relay
            .handle_event(&id, ClientEvent::join_room("room1", ""))
            .await;

        // then (期待する結果):
        assert_eq!(error_code(next_event(&mut rx)), Some(ErrorCode::InvalidState));
        assert!(fx.repository.list_rosters().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_frames_are_dropped() {
        // テスト項目: 不正なフレームは無視され、後続のイベントは通常通り処理される
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (id, mut rx) = connect(&fx).await;

        // when (操作):
        fx.relay.handle_text(&id, "not json").await;
        fx.relay
            .handle_text(&id, r#"{"event":"join_room","data":{"roomName":"room1"}}"#)
            .await;
        fx.relay
            .handle_text(&id, r#"{"event":"dance","data":{}}"#)
            .await;
        fx.relay
            .handle_text(
                &id,
                r#"{"event":"join_room","data":{"roomName":"room1","username":"Alice"}}"#,
            )
            .await;

        // then (期待する結果):
        assert_eq!(next_event(&mut rx), Some(ServerEvent::room_joined("room1")));
        assert!(next_event(&mut rx).is_none());
    }

    #[tokio::test]
    async fn test_blank_message_is_dropped() {
        // テスト項目: 空白のみのメッセージは配信されない
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (alice, mut alice_rx) = join(&fx, "Alice", "room1").await;

        // when (操作):
        fx.relay
            .handle_event(&alice, ClientEvent::send_message("room1", "Alice", "  \n "))
            .await;

        // then (期待する結果):
        assert!(next_event(&mut alice_rx).is_none());
    }

    #[tokio::test]
    async fn test_send_to_other_room_is_relayed_by_default() {
        // テスト項目: 既定では、所属していないルームへの送信もそのまま配信される
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (alice, mut alice_rx) = join(&fx, "Alice", "room1").await;
        let (_bob, mut bob_rx) = join(&fx, "Bob", "room2").await;

        // when (操作):
        fx.relay
            .handle_event(&alice, ClientEvent::send_message("room2", "Alice", "psst"))
            .await;

        // then (期待する結果):
        assert_eq!(
            next_event(&mut bob_rx),
            Some(ServerEvent::receive_message("Alice", "psst"))
        );
        assert!(next_event(&mut alice_rx).is_none());
    }

    #[tokio::test]
    async fn test_require_membership_rejects_foreign_room() {
        // テスト項目: require_membership 有効時、所属外ルームへの送信は not_in_room で拒否される
        // given (前提条件):
        let fx = fixture(RelayConfig {
            require_membership: true,
        });
        let (alice, mut alice_rx) = join(&fx, "Alice", "room1").await;
        let (_bob, mut bob_rx) = join(&fx, "Bob", "room2").await;

        // when (操作):
        fx.relay
            .handle_event(&alice, ClientEvent::send_message("room2", "Alice", "psst"))
            .await;

        // then (期待する結果):
        assert_eq!(error_code(next_event(&mut alice_rx)), Some(ErrorCode::NotInRoom));
        assert!(next_event(&mut bob_rx).is_none());
    }

    #[tokio::test]
    async fn test_require_membership_allows_own_room() {
        // テスト項目: require_membership 有効時でも自分のルームへの送信は配信される
        // given (前提条件):
        let fx = fixture(RelayConfig {
            require_membership: true,
        });
        let (alice, mut alice_rx) = join(&fx, "Alice", "room1").await;

        // when (操作):
        fx.relay
            .handle_event(&alice, ClientEvent::send_message("room1", "Alice", "hello"))
            .await;

        // then (期待する結果):
        assert_eq!(
            next_event(&mut alice_rx),
            Some(ServerEvent::receive_message("Alice", "hello"))
        );
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        // テスト項目: 切断は二回呼んでも安全で、ルームからも外れる
        // given (前提条件):
        let fx = fixture(RelayConfig::default());
        let (alice, _alice_rx) = join(&fx, "Alice", "room1").await;

        // when (操作):
        let first = fx.relay.disconnect(&alice).await;
        let second = fx.relay.disconnect(&alice).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(fx.repository.list_rosters().await.is_empty());
    }
}
