//! User-visible errors that clear themselves after a fixed window

use std::time::Duration;
use tokio::time::Instant;

/// Default display window
pub const DEFAULT_ERROR_WINDOW: Duration = Duration::from_secs(5);

/// An error message with the time it was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientError {
    message: String,
    created_at: Instant,
}

impl TransientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            created_at: Instant::now(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `None` when the window is too large to represent; such an error never expires
    pub fn expires_at(&self, window: Duration) -> Option<Instant> {
        self.created_at.checked_add(window)
    }

    pub fn is_expired(&self, window: Duration, now: Instant) -> bool {
        self.expires_at(window).is_some_and(|at| now >= at)
    }
}
