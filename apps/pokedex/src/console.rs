//! Terminal stand-ins for the browser's alert banner.

use client_core::Alerts;
use parking_lot::Mutex;

#[derive(Default)]
pub struct ConsoleAlerts {
    last: Mutex<Option<String>>,
}

impl ConsoleAlerts {
    pub fn last(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl Alerts for ConsoleAlerts {
    fn notify_error(&self, message: &str) {
        tracing::warn!(message, "alert raised");
        eprintln!("error: {message}");
        *self.last.lock() = Some(message.to_string());
    }
}
