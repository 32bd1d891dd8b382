//! Delivery alert controller.
//!
//! Every delivered message is logged, announced through the notification
//! dispatcher and starts the alarm. The alarm keeps ringing until the user
//! acknowledges it. At most one alarm exists at a time: the previous one is
//! stopped and released before a replacement is created.

use std::sync::Arc;

use belltower_shared::time::Clock;

use crate::error::AlertError;

/// Default alarm asset name handed to the player
pub const DEFAULT_ALARM_ASSET: &str = "alarm";

/// Result of asking for permission to show notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Visual notification sink (a system notification, a terminal banner, ...)
#[cfg_attr(test, mockall::automock)]
pub trait NotificationDispatcher: Send {
    fn request_permission(&mut self) -> PermissionStatus;

    fn dispatch(&mut self, title: &str, body: &str) -> Result<(), AlertError>;
}

/// Opaque handle to one created alarm
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AlarmHandle(u64);

impl AlarmHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Audible alarm backend
pub trait AlarmPlayer: Send {
    fn create(&mut self, asset: &str) -> Result<AlarmHandle, AlertError>;

    fn play(&mut self, handle: &AlarmHandle) -> Result<(), AlertError>;

    fn stop(&mut self, handle: &AlarmHandle);

    fn release(&mut self, handle: AlarmHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    Alerting,
}

/// One entry of the visible message log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub username: String,
    pub message: String,
    /// Unix millis
    pub received_at: i64,
}

/// Title of the notification raised for a message from `username`
pub fn notification_title(username: &str) -> String {
    format!("New Message from {}", username)
}

pub struct DeliveryAlertController {
    notifier: Box<dyn NotificationDispatcher>,
    alarm_player: Box<dyn AlarmPlayer>,
    clock: Arc<dyn Clock>,
    asset: String,
    permission: PermissionStatus,
    active_alarm: Option<AlarmHandle>,
    log: Vec<DeliveredMessage>,
}

impl DeliveryAlertController {
    /// Create the controller. Notification permission is requested once, here.
    pub fn new(
        mut notifier: Box<dyn NotificationDispatcher>,
        alarm_player: Box<dyn AlarmPlayer>,
        clock: Arc<dyn Clock>,
        asset: impl Into<String>,
    ) -> Self {
        let permission = notifier.request_permission();
        if permission == PermissionStatus::Denied {
            tracing::warn!("{}; messages are shown in the log only", AlertError::PermissionDenied);
        }

        Self {
            notifier,
            alarm_player,
            clock,
            asset: asset.into(),
            permission,
            active_alarm: None,
            log: Vec::new(),
        }
    }

    pub fn state(&self) -> AlertState {
        if self.active_alarm.is_some() {
            AlertState::Alerting
        } else {
            AlertState::Idle
        }
    }

    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    pub fn log(&self) -> &[DeliveredMessage] {
        &self.log
    }

    /// React to one delivered message.
    pub fn on_message(&mut self, username: &str, message: &str) -> &DeliveredMessage {
        self.log.push(DeliveredMessage {
            username: username.to_string(),
            message: message.to_string(),
            received_at: self.clock.now_millis(),
        });

        if self.permission == PermissionStatus::Granted
            && let Err(e) = self
                .notifier
                .dispatch(&notification_title(username), message)
        {
            tracing::warn!("Failed to dispatch notification: {}", e);
        }

        // Latest arrival owns the alarm.
        self.silence();
        self.start_alarm();

        &self.log[self.log.len() - 1]
    }

    /// Stop and release the ringing alarm. Returns `false` when already idle.
    pub fn acknowledge(&mut self) -> bool {
        let was_alerting = self.active_alarm.is_some();
        self.silence();
        was_alerting
    }

    fn start_alarm(&mut self) {
        let handle = match self.alarm_player.create(&self.asset) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("Failed to create alarm: {}", e);
                return;
            }
        };
        if let Err(e) = self.alarm_player.play(&handle) {
            tracing::warn!("Failed to play alarm: {}", e);
            self.alarm_player.release(handle);
            return;
        }
        self.active_alarm = Some(handle);
    }

    fn silence(&mut self) {
        if let Some(handle) = self.active_alarm.take() {
            self.alarm_player.stop(&handle);
            self.alarm_player.release(handle);
        }
    }
}

impl Drop for DeliveryAlertController {
    fn drop(&mut self) {
        self.silence();
    }
}
