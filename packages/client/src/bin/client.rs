//! Belltower terminal chat client.
//!
//! Asks for a display name, offers a fixed list of rooms and relays messages
//! typed at the prompt. Every received message raises a notification banner and
//! rings the terminal bell until `/ack` is typed.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin belltower-client
//! cargo run --bin belltower-client -- --name Alice --rooms room1,room2,lobby
//! ```

use std::time::Duration;

use belltower_client::{ClientOptions, domain::parse_room_name, run_client};
use belltower_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "belltower-client")]
#[command(about = "Terminal client for the Belltower room relay", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Display name to use instead of being prompted
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Rooms offered in the room picker
    #[arg(
        short = 'r',
        long,
        value_delimiter = ',',
        default_value = "room1,room2",
        value_parser = parse_room_name
    )]
    rooms: Vec<String>,

    /// Seconds to wait for the server to confirm a join
    #[arg(long, default_value_t = 5)]
    join_timeout_secs: u64,

    /// Do not show notification banners
    #[arg(long)]
    no_notifications: bool,

    /// Do not ring the terminal bell
    #[arg(long)]
    no_alarm: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_BIN_NAME"), "belltower-shared"], "info");

    let args = Args::parse();
    let options = ClientOptions {
        url: args.url,
        name: args.name,
        rooms: args.rooms,
        join_timeout: Duration::from_secs(args.join_timeout_secs),
        notifications: !args.no_notifications,
        alarm: !args.no_alarm,
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
