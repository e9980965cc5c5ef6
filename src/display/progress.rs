//! Progress display for requests that take a while

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const SPINNER_UPDATE_INTERVAL_MS: u64 = 100;
const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const CLEAR_LINE_WIDTH: usize = 100;

/// Spinner drawn on stderr while a query is in flight. Disabled spinners
/// draw nothing, which keeps piped output clean.
pub struct ProgressSpinner {
    message: String,
    enabled: bool,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            enabled: atty::is(atty::Stream::Stderr),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self) {
        if !self.enabled || self.handle.is_some() {
            return;
        }
        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);
        let message = self.message.clone();

        let handle = thread::spawn(move || {
            let mut index = 0;
            let mut stderr = io::stderr();

            while running.load(Ordering::Relaxed) {
                let _ = write!(stderr, "\r{} {}", SPINNER_CHARS[index], message);
                let _ = stderr.flush();

                index = (index + 1) % SPINNER_CHARS.len();
                thread::sleep(Duration::from_millis(SPINNER_UPDATE_INTERVAL_MS));
            }

            let _ = write!(stderr, "\r{:<width$}\r", "", width = CLEAR_LINE_WIDTH);
            let _ = stderr.flush();
        });

        self.handle = Some(handle);
    }

    /// Stop and clear the spinner line, optionally printing a final message
    pub fn stop(&mut self, completion_message: Option<&str>) {
        self.running.store(false, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        if let Some(msg) = completion_message {
            println!(" {}", msg);
        }
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        self.stop(None);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Warning,
    Error,
}

pub fn status_line(operation: &str, status: OperationStatus) -> String {
    let symbol = match status {
        OperationStatus::Success => "✅",
        OperationStatus::Warning => "⚠️",
        OperationStatus::Error => "❌",
    };
    // Leading space keeps wide emoji from clipping in some terminals
    format!(" {} {}", symbol, operation)
}

pub fn display_status(operation: &str, status: OperationStatus) {
    println!("{}", status_line(operation, status));
}
