/// Self-write tracker using board fingerprints.
///
/// Before every write: fingerprint the written board, register it.
/// On attribute change: fingerprint the incoming board, check against pending fingerprints.
/// Match found → consume fingerprint, suppress the change (our own write echoing back).
/// No match → external change, hand it to the reconciler.
/// TTL is cleanup only; fingerprints are consumed on match regardless.
use std::time::{Duration, Instant};

use crate::compare::BoardFingerprint;

struct PendingFingerprint {
    fingerprint: BoardFingerprint,
    registered_at: Instant,
}

pub struct SelfWriteTracker {
    /// Several writes may be in flight before the host reports them.
    pending: Vec<PendingFingerprint>,
    ttl: Duration,
}

impl SelfWriteTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Vec::new(),
            ttl,
        }
    }

    /// Register a fingerprint (called before writing).
    pub fn register(&mut self, fingerprint: BoardFingerprint, now: Instant) {
        self.pending.push(PendingFingerprint {
            fingerprint,
            registered_at: now,
        });
    }

    /// If `fingerprint` matches a pending self-write, consume it and return true.
    pub fn check_and_consume(&mut self, fingerprint: &BoardFingerprint) -> bool {
        if let Some(pos) = self
            .pending
            .iter()
            .position(|e| &e.fingerprint == fingerprint)
        {
            self.pending.remove(pos);
            return true;
        }
        false
    }

    /// Remove expired fingerprints.
    pub fn cleanup_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.pending
            .retain(|e| now.saturating_duration_since(e.registered_at) < ttl);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
