//! Reconciler: adopts externally changed attribute values into the live board.
//!
//! Incoming values are validated (falling back to the seed board), checked
//! against pending self-write fingerprints, then compared with the live board
//! by canonical key. Only a materially different value replaces the live
//! board. There is no merging: the last observed value wins.

pub mod echo;

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::compare::{canonical_key, diff_boards, diff::summarize, BoardChange, BoardFingerprint};
use crate::model::shape::{load_board, LoadSource};
use crate::types::Board;
use echo::SelfWriteTracker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Echo of one of our own writes.
    SelfWrite,
    /// Materially equal to the live board.
    Unchanged,
    /// The live board must be replaced by `board`.
    Adopted {
        board: Board,
        changes: Vec<BoardChange>,
        source: LoadSource,
    },
}

pub struct Reconciler {
    echoes: SelfWriteTracker,
    /// Fingerprint of the most recent write.
    last_written: Option<BoardFingerprint>,
}

impl Reconciler {
    pub fn new(echo_ttl: Duration) -> Self {
        Self {
            echoes: SelfWriteTracker::new(echo_ttl),
            last_written: None,
        }
    }

    /// Remember a board we are about to write so its echo can be recognized.
    pub fn register_fingerprint(&mut self, fingerprint: BoardFingerprint, now: Instant) {
        self.echoes.register(fingerprint.clone(), now);
        self.last_written = Some(fingerprint);
    }

    /// Reconcile the current attribute after change notifications were lost.
    ///
    /// Echoes of the lost notifications will never arrive, so every pending
    /// fingerprint is dropped. Only the most recent write still counts as our
    /// own; any earlier state showing up later is a host history step.
    pub fn resync(&mut self, current: Option<&Value>, live: &Board, now: Instant) -> ReconcileOutcome {
        if self.echoes.has_pending() {
            log::debug!("[lexera.embed.reconcile] Dropping self-write fingerprints of lost notifications");
        }
        self.echoes.clear();
        if let Some(fingerprint) = self.last_written.clone() {
            self.echoes.register(fingerprint, now);
        }
        let outcome = self.reconcile(current, live, now);
        self.echoes.clear();
        outcome
    }

    pub fn reconcile(&mut self, incoming: Option<&Value>, live: &Board, now: Instant) -> ReconcileOutcome {
        self.echoes.cleanup_expired(now);

        let loaded = load_board(incoming);
        match &loaded.source {
            LoadSource::Seeded(e) => {
                log::warn!(
                    "[lexera.embed.reconcile] Attribute failed shape validation ({}), using seed board",
                    e
                );
            }
            LoadSource::Repaired { repairs } => {
                log::warn!(
                    "[lexera.embed.reconcile] Attribute needed {} reference repairs",
                    repairs
                );
            }
            LoadSource::Stored => {}
        }

        let incoming_key = canonical_key(&loaded.board);
        if !loaded.is_seeded()
            && self
                .echoes
                .check_and_consume(&BoardFingerprint::from_key(&incoming_key))
        {
            log::debug!("[lexera.embed.reconcile] Suppressed self-write echo");
            return ReconcileOutcome::SelfWrite;
        }

        // A repaired value matching the live board still holds broken
        // references on the host side, so it goes through adoption.
        let repaired = matches!(loaded.source, LoadSource::Repaired { .. });
        if !repaired && incoming_key == canonical_key(live) {
            log::debug!("[lexera.embed.reconcile] Incoming attribute matches live board");
            return ReconcileOutcome::Unchanged;
        }

        let changes = diff_boards(live, &loaded.board);
        log::info!(
            "[lexera.embed.reconcile] Adopting external board change: {}",
            summarize(&changes)
        );
        ReconcileOutcome::Adopted {
            board: loaded.board,
            changes,
            source: loaded.source,
        }
    }

    pub fn clear(&mut self) {
        self.echoes.clear();
        self.last_written = None;
    }
}
