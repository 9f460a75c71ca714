/// Recovery after host-side validation failures.
///
/// The host reports failures for any node type it rejected. Failures naming
/// our node type arm a single recovery timer; when it fires, the owner re-writes
/// the live board with a recovery marker. Further failures while armed do not
/// push the timer back.
use std::time::{Duration, Instant};

use crate::host::ValidationFailure;

#[derive(Debug)]
pub struct RecoveryController {
    node_type: String,
    delay: Duration,
    due: Option<Instant>,
}

impl RecoveryController {
    pub fn new(node_type: impl Into<String>, delay: Duration) -> Self {
        Self {
            node_type: node_type.into(),
            delay,
            due: None,
        }
    }

    /// Returns true if the failure concerns this node type and recovery is armed.
    pub fn on_validation_failure(&mut self, failure: &ValidationFailure, now: Instant) -> bool {
        if failure.node_type != self.node_type {
            log::debug!(
                "[lexera.embed.recovery] Ignoring validation failure for node type {}",
                failure.node_type
            );
            return false;
        }
        if self.due.is_none() {
            self.due = Some(now + self.delay);
            log::warn!(
                "[lexera.embed.recovery] Host rejected {} content: {}; recovery in {:?}",
                self.node_type,
                failure.message,
                self.delay
            );
        }
        true
    }

    /// True once when the armed recovery is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.due
    }

    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }
}
