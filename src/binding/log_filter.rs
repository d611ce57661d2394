//! Rate limiting for per-binding log messages.
//!
//! High-frequency triggers would otherwise repeat the same script failure on
//! every firing. Each binding owns one filter; a given message text passes the
//! filter once.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct LogFilter {
    seen: HashSet<String>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `message` is offered, false afterwards.
    pub fn should_log(&mut self, message: &str) -> bool {
        if self.seen.contains(message) {
            return false;
        }
        self.seen.insert(message.to_string());
        true
    }

    /// Forget every message, e.g. after the binding is edited.
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
