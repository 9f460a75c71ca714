//! Persistence scheduler: decides when a committed board reaches the host.
//!
//! There is at most one pending write. Immediate commits cancel it and write
//! now; debounced commits replace it and restart the quiet period, so only the
//! last value of a burst of keystrokes is written. A board materially equal to
//! the last persisted one is never written.
//!
//! The scheduler is driven by explicit `Instant`s and never touches the host
//! itself; the caller performs the writes it hands out.

use std::time::{Duration, Instant};

use crate::compare::canonical_key;
use crate::types::Board;

/// How a committed mutation should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// Structural edits, blur and Enter commits.
    Immediate,
    /// Keystroke-level edits while the field keeps focus.
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Materially equal to what the host already holds.
    Skipped,
    /// Write this board now.
    WriteNow(Board),
    /// A write is pending until `due`.
    Scheduled { due: Instant },
    /// The scheduler was closed by teardown.
    Closed,
}

#[derive(Debug, Clone)]
struct PendingWrite {
    board: Board,
    due: Instant,
}

#[derive(Debug)]
pub struct PersistenceScheduler {
    debounce: Duration,
    last_persisted_key: Option<String>,
    pending: Option<PendingWrite>,
    closed: bool,
}

impl PersistenceScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_persisted_key: None,
            pending: None,
            closed: false,
        }
    }

    pub fn commit(&mut self, board: &Board, kind: CommitKind, now: Instant) -> ScheduleDecision {
        if self.closed {
            return ScheduleDecision::Closed;
        }

        let key = canonical_key(board);
        if self.last_persisted_key.as_deref() == Some(key.as_str()) {
            // Back to the persisted state: whatever was pending is stale.
            if self.pending.take().is_some() {
                log::debug!("[lexera.embed.persist] Pending write dropped, board matches persisted state");
            }
            return ScheduleDecision::Skipped;
        }

        match kind {
            CommitKind::Immediate => {
                self.pending = None;
                self.last_persisted_key = Some(key);
                ScheduleDecision::WriteNow(board.clone())
            }
            CommitKind::Debounced => {
                let due = now + self.debounce;
                if self.pending.is_some() {
                    log::debug!("[lexera.embed.persist] Debounce restarted");
                }
                self.pending = Some(PendingWrite {
                    board: board.clone(),
                    due,
                });
                ScheduleDecision::Scheduled { due }
            }
        }
    }

    /// Hand out the pending board if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Board> {
        match &self.pending {
            Some(p) if p.due <= now => self.take_pending(),
            _ => None,
        }
    }

    /// Hand out the pending board regardless of its due time (blur / Enter).
    pub fn flush(&mut self) -> Option<Board> {
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<Board> {
        let pending = self.pending.take()?;
        let key = canonical_key(&pending.board);
        if self.last_persisted_key.as_deref() == Some(key.as_str()) {
            return None;
        }
        self.last_persisted_key = Some(key);
        Some(pending.board)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel the pending write. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Record that the host now holds `board` (adopted or written out of band).
    pub fn mark_persisted(&mut self, board: &Board) {
        self.last_persisted_key = Some(canonical_key(board));
    }

    /// Forget what the host holds; the next commit always writes.
    pub fn mark_unknown(&mut self) {
        self.last_persisted_key = None;
    }

    /// Teardown: cancel the pending write and refuse further commits.
    /// Returns the board that was still waiting, if any.
    pub fn close(&mut self) -> Option<Board> {
        self.closed = true;
        self.pending.take().map(|p| p.board)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ops::{add_card, rename_board};
    use crate::model::seed::seed_board;

    const INTERVAL: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn scheduler_with_seed() -> PersistenceScheduler {
        let mut s = PersistenceScheduler::new(INTERVAL);
        s.mark_persisted(&seed_board());
        s
    }

    #[test]
    fn test_unchanged_board_is_skipped() {
        let mut s = scheduler_with_seed();
        let t0 = Instant::now();
        assert_eq!(s.commit(&seed_board(), CommitKind::Immediate, t0), ScheduleDecision::Skipped);
        assert_eq!(s.commit(&seed_board(), CommitKind::Debounced, t0), ScheduleDecision::Skipped);
        assert!(!s.has_pending());
    }

    #[test]
    fn test_immediate_writes_now() {
        let mut s = scheduler_with_seed();
        let next = add_card(&seed_board(), "col-1");
        let decision = s.commit(&next, CommitKind::Immediate, Instant::now());
        assert_eq!(decision, ScheduleDecision::WriteNow(next.clone()));
        // Persisted now, so an identical commit is skipped
        assert_eq!(s.commit(&next, CommitKind::Immediate, Instant::now()), ScheduleDecision::Skipped);
    }

    #[test]
    fn test_debounce_coalesces_to_last_value() {
        let mut s = scheduler_with_seed();
        let t0 = Instant::now();
        let e1 = rename_board(&seed_board(), "a");
        let e2 = rename_board(&seed_board(), "ab");
        let e3 = rename_board(&seed_board(), "abc");

        s.commit(&e1, CommitKind::Debounced, t0);
        s.commit(&e2, CommitKind::Debounced, t0 + ms(100));
        let decision = s.commit(&e3, CommitKind::Debounced, t0 + ms(200));
        assert_eq!(decision, ScheduleDecision::Scheduled { due: t0 + ms(700) });

        assert_eq!(s.poll(t0 + ms(500)), None);
        assert_eq!(s.poll(t0 + ms(699)), None);
        assert_eq!(s.poll(t0 + ms(700)), Some(e3));
        assert_eq!(s.poll(t0 + ms(2000)), None);
    }

    #[test]
    fn test_flush_writes_early() {
        let mut s = scheduler_with_seed();
        let t0 = Instant::now();
        let edit = rename_board(&seed_board(), "typed");
        s.commit(&edit, CommitKind::Debounced, t0);
        assert_eq!(s.flush(), Some(edit));
        assert_eq!(s.next_deadline(), None);
        assert_eq!(s.poll(t0 + ms(600)), None);
    }

    #[test]
    fn test_immediate_cancels_pending() {
        let mut s = scheduler_with_seed();
        let t0 = Instant::now();
        let typed = rename_board(&seed_board(), "typed");
        s.commit(&typed, CommitKind::Debounced, t0);
        let structural = add_card(&typed, "col-1");
        assert_eq!(
            s.commit(&structural, CommitKind::Immediate, t0 + ms(10)),
            ScheduleDecision::WriteNow(structural)
        );
        assert!(!s.has_pending());
        assert_eq!(s.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn test_typing_back_to_persisted_drops_pending() {
        let mut s = scheduler_with_seed();
        let t0 = Instant::now();
        s.commit(&rename_board(&seed_board(), "Boardx"), CommitKind::Debounced, t0);
        assert_eq!(s.commit(&seed_board(), CommitKind::Debounced, t0 + ms(50)), ScheduleDecision::Skipped);
        assert!(!s.has_pending());
    }

    #[test]
    fn test_close_refuses_further_commits() {
        let mut s = scheduler_with_seed();
        let t0 = Instant::now();
        let typed = rename_board(&seed_board(), "typed");
        s.commit(&typed, CommitKind::Debounced, t0);
        assert_eq!(s.close(), Some(typed));
        assert!(s.is_closed());
        let next = add_card(&seed_board(), "col-1");
        assert_eq!(s.commit(&next, CommitKind::Immediate, t0), ScheduleDecision::Closed);
        assert_eq!(s.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn test_unknown_state_always_writes() {
        let mut s = PersistenceScheduler::new(INTERVAL);
        assert_eq!(
            s.commit(&seed_board(), CommitKind::Immediate, Instant::now()),
            ScheduleDecision::WriteNow(seed_board())
        );
    }
}
