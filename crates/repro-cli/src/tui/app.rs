//! TUI application state

use std::time::{Duration, Instant};

use repro_core::Item;

/// How long a status message stays on screen
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

pub struct App {
    /// Items currently shown, kept fresh by the live query
    pub items: Vec<Item>,
    pub status_message: Option<String>,
    status_set_at: Option<Instant>,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            status_message: None,
            status_set_at: None,
            should_quit: false,
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_set_at = Some(Instant::now());
    }

    /// Clear the status message once it has been visible long enough
    pub fn check_status_timeout(&mut self) {
        if let Some(set_at) = self.status_set_at {
            if set_at.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_set_at = None;
            }
        }
    }
}
