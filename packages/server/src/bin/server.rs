//! Belltower relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin belltower-server
//! cargo run --bin belltower-server -- --host 0.0.0.0 --port 3000 --require-membership
//! ```

use std::sync::Arc;

use belltower_server::{
    config::RelayConfig,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRelayRepository},
    ui::{Relay, Server},
    usecase::{ConnectionRegistry, RoomBroadcaster, RoomQueryUseCase},
};
use belltower_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "belltower-server")]
#[command(about = "Room-scoped WebSocket message relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3000")]
    port: u16,

    /// Reject messages addressed to a room the sender has not joined
    #[arg(long)]
    require_membership: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_BIN_NAME"), "belltower-shared", "tower_http"], "debug");

    let args = Args::parse();
    let config = RelayConfig {
        require_membership: args.require_membership,
    };
    tracing::debug!("Relay config: {:?}", config);

    // 1. Repository（インメモリ）
    let repository = Arc::new(InMemoryRelayRepository::new());

    // 2. MessagePusher（WebSocket 実装）
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. UseCases
    let broadcaster = Arc::new(RoomBroadcaster::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let registry = Arc::new(ConnectionRegistry::new(
        repository.clone(),
        message_pusher.clone(),
        broadcaster.clone(),
    ));
    let room_query = Arc::new(RoomQueryUseCase::new(broadcaster.clone()));

    // 4. Relay
    let relay = Arc::new(Relay::new(registry, broadcaster, message_pusher, config));

    // 5. Server
    let server = Server::new(relay, room_query);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
