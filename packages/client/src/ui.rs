//! UI utilities for the client.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use crate::session::SessionView;

/// Prompt text shared between the runner and the readline thread.
#[derive(Clone, Default)]
pub struct Prompt(Arc<Mutex<String>>);

impl Prompt {
    pub fn set(&self, text: impl Into<String>) {
        let mut current = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = text.into();
    }

    pub fn get(&self) -> String {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Prompt text for the given view
pub fn prompt_for(view: &SessionView, username: Option<&str>) -> String {
    match view {
        SessionView::NamePrompt => "name> ".to_string(),
        SessionView::RoomPicker { .. } => "room> ".to_string(),
        SessionView::Chat { room, pending } => {
            let marker = if *pending { "…" } else { "" };
            format!("{}@{}{}> ", username.unwrap_or("?"), room, marker)
        }
    }
}

/// Redisplay the prompt after printing asynchronous output
pub fn redisplay_prompt(prompt: &Prompt) {
    print!("{}", prompt.get());
    std::io::stdout().flush().ok();
}
