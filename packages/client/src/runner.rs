//! Client execution logic with reconnection support.

use std::{sync::Arc, time::Duration};

use belltower_shared::{
    protocol::{ClientEvent, ServerEvent},
    time::{Clock, SystemClock},
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::{
    alert::{DEFAULT_ALARM_ASSET, DeliveryAlertController},
    domain::{InputCommand, parse_input, resolve_room_choice, should_attempt_reconnect},
    error::ClientError,
    formatter::MessageFormatter,
    session::{ClientSession, SessionState, SessionUpdate, SessionView},
    terminal::{BellAlarm, TerminalNotifier},
    ui::{Prompt, prompt_for, redisplay_prompt},
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Command-line driven client settings
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    /// Pre-filled display name
    pub name: Option<String>,
    pub rooms: Vec<String>,
    pub join_timeout: Duration,
    pub notifications: bool,
    pub alarm: bool,
}

/// How a session ended without a transport failure
enum SessionEnd {
    Quit,
}

/// Run the client with reconnection logic
///
/// Every reconnect starts a fresh session; the display name chosen earlier is
/// reused so the user lands on the room picker again.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut alerts = DeliveryAlertController::new(
        Box::new(TerminalNotifier::new(options.notifications)),
        Box::new(BellAlarm::new(options.alarm)),
        clock.clone(),
        DEFAULT_ALARM_ASSET,
    );

    let prompt = Prompt::default();
    let mut input_rx = spawn_input_thread(prompt.clone());
    let mut remembered_name = options.name.clone();
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            options.url,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_session(
            &options,
            clock.clone(),
            &mut alerts,
            &mut input_rx,
            &prompt,
            &mut remembered_name,
        )
        .await
        {
            Ok(SessionEnd::Quit) => {
                tracing::info!("Client session ended normally");
                break;
            }
            Err(e) => {
                if !should_attempt_reconnect(&e, reconnect_count + 1, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!(
                        "Giving up after {} attempt(s). Exiting.",
                        reconnect_count + 1
                    );
                    return Err(e);
                }

                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;
                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }

    Ok(())
}

/// Spawn a blocking thread for rustyline (synchronous readline)
fn spawn_input_thread(prompt: Prompt) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt.get()) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    if input_tx.send(line).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Run one connection: a fresh session driven by server frames, user lines
/// and the join deadline.
async fn run_session(
    options: &ClientOptions,
    clock: Arc<dyn Clock>,
    alerts: &mut DeliveryAlertController,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
    prompt: &Prompt,
    remembered_name: &mut Option<String>,
) -> Result<SessionEnd, ClientError> {
    let (ws_stream, _response) = connect_async(options.url.as_str())
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    tracing::info!("Connected to relay server!");

    let (mut write, mut read) = ws_stream.split();
    let mut session = ClientSession::new(options.rooms.clone(), options.join_timeout, clock.clone());

    print!("{}", MessageFormatter::format_welcome());
    if let Some(name) = remembered_name.as_deref()
        && let Err(e) = session.submit_name(name)
    {
        tracing::warn!("Ignoring pre-filled name: {}", e);
        *remembered_name = None;
    }
    render_view(&session, prompt);

    loop {
        let join_wait = session.join_deadline().map(|deadline| {
            let remaining = deadline.saturating_sub(clock.now_millis()).max(0);
            Duration::from_millis(u64::try_from(remaining).unwrap_or_default())
        });

        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match ServerEvent::from_json(text.as_str()) {
                    Ok(event) => {
                        handle_server_event(&mut session, alerts, &event, prompt);
                        if session.username().is_none() {
                            // The server refused the name; do not reuse it on reconnect.
                            *remembered_name = None;
                        }
                    }
                    Err(e) => tracing::warn!("Ignoring malformed server frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionError("Connection lost".to_string()));
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                Some(Ok(_)) => {}
            },
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // Input closed (Ctrl+C / Ctrl+D)
                    return Ok(SessionEnd::Quit);
                };
                match parse_input(&line) {
                    InputCommand::Quit => return Ok(SessionEnd::Quit),
                    InputCommand::Acknowledge => {
                        if !alerts.acknowledge() {
                            tracing::debug!("Nothing to acknowledge");
                        }
                    }
                    InputCommand::Text(text) => {
                        handle_line(&mut session, &mut write, &text, remembered_name).await?;
                        prompt.set(prompt_for(&session.view(), session.username()));
                    }
                }
            },
            _ = tokio::time::sleep(join_wait.unwrap_or_default()), if join_wait.is_some() => {
                if session.check_join_timeout() {
                    tracing::warn!("Join was not confirmed in time");
                    render_view(&session, prompt);
                }
            },
        }
    }
}

/// Interpret one typed line according to the current state
async fn handle_line(
    session: &mut ClientSession,
    write: &mut WsSink,
    line: &str,
    remembered_name: &mut Option<String>,
) -> Result<(), ClientError> {
    let outgoing = match session.state().clone() {
        SessionState::Unauthenticated => match session.submit_name(line) {
            Ok(()) => {
                *remembered_name = session.username().map(str::to_string);
                render_room_picker(session);
                None
            }
            Err(e) => {
                print!("{}", MessageFormatter::format_rejected(&e.to_string()));
                None
            }
        },
        SessionState::Named { .. } => {
            let choice = resolve_room_choice(session.rooms(), line).to_string();
            match session.select_room(&choice) {
                Ok(event) => Some(event),
                Err(e) => {
                    print!("{}", MessageFormatter::format_rejected(&e.to_string()));
                    None
                }
            }
        }
        SessionState::Joining { .. } | SessionState::Chatting { .. } => {
            session.set_draft(line);
            match session.submit_message() {
                Ok(event) => event,
                Err(e) => {
                    print!("{}", MessageFormatter::format_rejected(&e.to_string()));
                    None
                }
            }
        }
    };

    if let Some(event) = outgoing {
        send_event(write, &event).await?;
    }
    Ok(())
}

async fn send_event(write: &mut WsSink, event: &ClientEvent) -> Result<(), ClientError> {
    let json = event.to_json()?;
    tracing::debug!("Sending '{}'", event.name());
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))
}

fn handle_server_event(
    session: &mut ClientSession,
    alerts: &mut DeliveryAlertController,
    event: &ServerEvent,
    prompt: &Prompt,
) {
    match session.handle_server_event(event) {
        SessionUpdate::Joined { room } => {
            print!("{}", MessageFormatter::format_joined(&room));
        }
        SessionUpdate::JoinFailed { reason } => {
            tracing::warn!("Join failed: {}", reason);
            if session.username().is_none() {
                print!("{}", MessageFormatter::format_rejected(&reason));
            }
        }
        SessionUpdate::Delivered(payload) => {
            let entry = alerts.on_message(&payload.username, &payload.message);
            print!(
                "{}",
                MessageFormatter::format_message(&entry.username, &entry.message, entry.received_at)
            );
        }
        SessionUpdate::ServerError(payload) => {
            print!(
                "{}",
                MessageFormatter::format_server_error(payload.code, &payload.message)
            );
        }
        SessionUpdate::Ignored => {
            tracing::debug!("Ignoring server event in state {:?}", session.state());
            return;
        }
    }
    render_view(session, prompt);
}

/// Update the prompt for the current view and show the room picker when needed
fn render_view(session: &ClientSession, prompt: &Prompt) {
    let view = session.view();
    if matches!(view, SessionView::RoomPicker { .. }) {
        render_room_picker(session);
    }
    prompt.set(prompt_for(&view, session.username()));
    redisplay_prompt(prompt);
}

fn render_room_picker(session: &ClientSession) {
    print!(
        "{}",
        MessageFormatter::format_room_picker(session.rooms(), session.last_error())
    );
}
