//! Operator-facing status throttling.
//!
//! The scan loop produces a guidance string on almost every tick; emitting
//! each one would flood the UI. The throttle enforces a minimum gap
//! between any two emissions and a longer gap before the same message is
//! repeated.

use std::time::{Duration, Instant};

/// Debounces duplicate and rapid-fire status messages.
#[derive(Debug, Clone)]
pub struct StatusThrottle {
    min_gap: Duration,
    repeat_gap: Duration,
    last_message: Option<String>,
    last_emit: Option<Instant>,
}

impl StatusThrottle {
    pub fn new(min_gap: Duration, repeat_gap: Duration) -> Self {
        Self {
            min_gap,
            repeat_gap,
            last_message: None,
            last_emit: None,
        }
    }

    /// Offer a message for emission now.
    pub fn offer(&mut self, message: &str) -> Option<String> {
        self.offer_at(message, Instant::now())
    }

    /// Offer a message at an explicit instant. Returns the message when
    /// it should reach the operator, `None` when suppressed.
    pub fn offer_at(&mut self, message: &str, now: Instant) -> Option<String> {
        if let Some(last) = self.last_emit {
            let elapsed = now.duration_since(last);
            if elapsed < self.min_gap {
                return None;
            }
            if self.last_message.as_deref() == Some(message) && elapsed < self.repeat_gap {
                return None;
            }
        }
        self.last_message = Some(message.to_string());
        self.last_emit = Some(now);
        Some(message.to_string())
    }
}

impl Default for StatusThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(400), Duration::from_millis(1200))
    }
}
