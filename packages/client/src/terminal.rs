//! Terminal backends for the alert controller.

use std::{collections::HashMap, io::Write, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    alert::{AlarmHandle, AlarmPlayer, NotificationDispatcher, PermissionStatus},
    error::AlertError,
    formatter::MessageFormatter,
};

/// Prints notifications as a banner above the prompt.
pub struct TerminalNotifier {
    enabled: bool,
}

impl TerminalNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl NotificationDispatcher for TerminalNotifier {
    fn request_permission(&mut self) -> PermissionStatus {
        if self.enabled {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    fn dispatch(&mut self, title: &str, body: &str) -> Result<(), AlertError> {
        if !self.enabled {
            return Err(AlertError::PermissionDenied);
        }
        print!("{}", MessageFormatter::format_notification(title, body));
        std::io::stdout()
            .flush()
            .map_err(|e| AlertError::Alarm(e.to_string()))
    }
}

/// Interval between two bell rings
const BELL_INTERVAL: Duration = Duration::from_millis(1500);

/// Rings the terminal bell (BEL) repeatedly until stopped.
///
/// Each played alarm is a tokio task; `stop` aborts it. With `audible` off the
/// alarm is tracked but never rings.
pub struct BellAlarm {
    audible: bool,
    interval: Duration,
    next_id: u64,
    alarms: HashMap<u64, Option<JoinHandle<()>>>,
}

impl BellAlarm {
    pub fn new(audible: bool) -> Self {
        Self::with_interval(audible, BELL_INTERVAL)
    }

    pub fn with_interval(audible: bool, interval: Duration) -> Self {
        Self {
            audible,
            interval,
            next_id: 0,
            alarms: HashMap::new(),
        }
    }

    /// Number of created and not yet released alarms
    pub fn live_count(&self) -> usize {
        self.alarms.len()
    }

    /// Number of alarms currently ringing
    pub fn ringing_count(&self) -> usize {
        self.alarms
            .values()
            .filter(|task| task.as_ref().is_some_and(|task| !task.is_finished()))
            .count()
    }
}

impl AlarmPlayer for BellAlarm {
    fn create(&mut self, asset: &str) -> Result<AlarmHandle, AlertError> {
        self.next_id += 1;
        self.alarms.insert(self.next_id, None);
        tracing::debug!("Alarm {} created from '{}'", self.next_id, asset);
        Ok(AlarmHandle::new(self.next_id))
    }

    fn play(&mut self, handle: &AlarmHandle) -> Result<(), AlertError> {
        let Some(slot) = self.alarms.get_mut(&handle.id()) else {
            return Err(AlertError::Alarm(format!(
                "alarm {} was already released",
                handle.id()
            )));
        };
        if !self.audible {
            return Ok(());
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AlertError::Alarm(e.to_string()))?;

        let interval = self.interval;
        let task = runtime.spawn(async move {
            loop {
                print!("\x07");
                std::io::stdout().flush().ok();
                tokio::time::sleep(interval).await;
            }
        });
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
        Ok(())
    }

    fn stop(&mut self, handle: &AlarmHandle) {
        if let Some(Some(task)) = self.alarms.get_mut(&handle.id()).map(Option::take) {
            task.abort();
        }
    }

    fn release(&mut self, handle: AlarmHandle) {
        if let Some(Some(task)) = self.alarms.remove(&handle.id()) {
            task.abort();
        }
        tracing::debug!("Alarm {} released", handle.id());
    }
}
