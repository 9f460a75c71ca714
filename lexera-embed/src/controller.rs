/// One embedded board instance.
///
/// Owns the live board and wires the model, the persistence scheduler, the
/// reconciler and the recovery controller to a host document:
/// - `apply` runs a mutation and hands the result to the scheduler
/// - `poll` fires due debounce and recovery timers
/// - `on_attribute_changed` / `on_validation_failure` react to host events
/// - `teardown` cancels timers; no write happens afterwards
///
/// Time is passed in explicitly so the same code runs under a real event loop
/// and in tests.
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::compare::{materially_equal, BoardFingerprint};
use crate::config::{ConfigError, SyncConfig};
use crate::deadline_bus::DeadlineUpdate;
use crate::host::{HostDocument, ValidationFailure};
use crate::interaction::Mutation;
use crate::model::shape::{load_board, LoadSource};
use crate::model::{check_invariants, BoardOp, BoardStats, CardField};
use crate::persist::{CommitKind, PersistenceScheduler, ScheduleDecision};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::recovery::RecoveryController;
use crate::types::{Board, BoardAttribute};

/// Why a write was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteReason {
    Immediate,
    Debounced,
    Flush,
    Repair,
    Recovery,
}

pub struct BoardController<H: HostDocument> {
    host: H,
    config: SyncConfig,
    live: Board,
    scheduler: PersistenceScheduler,
    reconciler: Reconciler,
    recovery: RecoveryController,
    /// Incremented whenever the live board is replaced or mutated.
    revision: u64,
    torn_down: bool,
}

impl<H: HostDocument> BoardController<H> {
    /// Load the board from the host attribute. An absent or unusable value is
    /// replaced by the seed board, which is written back immediately.
    pub fn mount(host: H, config: SyncConfig, now: Instant) -> Result<Self, ConfigError> {
        config.validate()?;

        let loaded = load_board(host.get_attribute().as_ref());
        let mut controller = Self {
            scheduler: PersistenceScheduler::new(config.debounce()),
            reconciler: Reconciler::new(config.echo_ttl()),
            recovery: RecoveryController::new(config.node_type.clone(), config.recovery_delay()),
            live: loaded.board,
            host,
            config,
            revision: 0,
            torn_down: false,
        };

        match loaded.source {
            LoadSource::Stored => {
                controller.scheduler.mark_persisted(&controller.live);
                log::info!(
                    "[lexera.embed.mount] Loaded board '{}' ({} columns, {} cards)",
                    controller.live.title,
                    controller.live.columns.len(),
                    controller.live.cards.len()
                );
            }
            LoadSource::Repaired { repairs } => {
                log::warn!(
                    "[lexera.embed.mount] Stored board needed {} repairs, writing repaired board",
                    repairs
                );
                controller.write(controller.live.clone(), WriteReason::Repair, now);
            }
            LoadSource::Seeded(e) => {
                log::info!("[lexera.embed.mount] No usable board attribute ({}), seeding", e);
                controller.write(controller.live.clone(), WriteReason::Immediate, now);
            }
        }
        Ok(controller)
    }

    pub fn board(&self) -> &Board {
        &self.live
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn has_pending_write(&self) -> bool {
        self.scheduler.has_pending()
    }

    pub fn stats(&self, today: NaiveDate) -> BoardStats {
        BoardStats::compute(&self.live, &self.config.default_completion_column, today)
    }

    /// Apply an operation with an explicit persistence kind.
    /// Returns true when the live board changed.
    pub fn apply(&mut self, op: BoardOp, kind: CommitKind, now: Instant) -> bool {
        if self.torn_down {
            log::debug!("[lexera.embed.apply] Ignoring {} after teardown", op.name());
            return false;
        }

        let next = op.apply(&self.live);
        debug_assert!(
            check_invariants(&next).is_ok(),
            "{} broke board invariants: {:?}",
            op.name(),
            check_invariants(&next)
        );

        let changed = !materially_equal(&next, &self.live);
        if changed {
            self.live = next;
            self.revision += 1;
        } else {
            log::debug!("[lexera.embed.apply] {} left the board unchanged", op.name());
        }

        // Commit even without a change: an immediate commit of a value equal to
        // the persisted state cancels a stale pending write.
        self.commit(kind, now);
        changed
    }

    pub fn apply_mutation(&mut self, mutation: Mutation, now: Instant) -> bool {
        self.apply(mutation.op, mutation.kind, now)
    }

    fn commit(&mut self, kind: CommitKind, now: Instant) {
        match self.scheduler.commit(&self.live, kind, now) {
            ScheduleDecision::WriteNow(board) => {
                let reason = match kind {
                    CommitKind::Immediate => WriteReason::Immediate,
                    CommitKind::Debounced => WriteReason::Debounced,
                };
                self.write(board, reason, now);
            }
            ScheduleDecision::Scheduled { .. } | ScheduleDecision::Skipped => {}
            ScheduleDecision::Closed => {
                log::debug!("[lexera.embed.persist] Scheduler closed, not persisting");
            }
        }
    }

    /// Blur or commit key: write any pending edit now.
    pub fn flush(&mut self, now: Instant) {
        if let Some(board) = self.scheduler.flush() {
            self.write(board, WriteReason::Flush, now);
        }
    }

    /// Fire due timers.
    pub fn poll(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        if let Some(board) = self.scheduler.poll(now) {
            self.write(board, WriteReason::Debounced, now);
        }
        if self.recovery.poll(now) {
            self.recover(now);
        }
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.scheduler.next_deadline(), self.recovery.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// The host reports a new attribute value.
    pub fn on_attribute_changed(&mut self, value: Option<&Value>, now: Instant) -> bool {
        if self.torn_down {
            return false;
        }
        let outcome = self.reconciler.reconcile(value, &self.live, now);
        self.adopt(outcome, now)
    }

    /// Change notifications were lost: reconcile against the current
    /// attribute, with only the latest own write still counted as an echo.
    pub fn resync(&mut self, now: Instant) -> bool {
        if self.torn_down {
            return false;
        }
        let current = self.host.get_attribute();
        let outcome = self.reconciler.resync(current.as_ref(), &self.live, now);
        self.adopt(outcome, now)
    }

    fn adopt(&mut self, outcome: ReconcileOutcome, now: Instant) -> bool {
        let ReconcileOutcome::Adopted { board, source, .. } = outcome else {
            return false;
        };

        if matches!(source, LoadSource::Seeded(_)) && self.recovery.is_armed() {
            // The host dropped our content; recovery is about to re-assert it.
            log::info!("[lexera.embed.reconcile] Ignoring unusable attribute while recovery is pending");
            return false;
        }

        if self.scheduler.cancel() {
            log::info!("[lexera.embed.reconcile] External change superseded a pending write");
        }
        if !materially_equal(&board, &self.live) {
            self.live = board;
            self.revision += 1;
        }
        match source {
            LoadSource::Stored => self.scheduler.mark_persisted(&self.live),
            LoadSource::Repaired { repairs } => {
                log::info!(
                    "[lexera.embed.reconcile] Writing back board after {} reference repairs",
                    repairs
                );
                self.write(self.live.clone(), WriteReason::Repair, now);
            }
            LoadSource::Seeded(_) => self.scheduler.mark_unknown(),
        }
        true
    }

    pub fn on_validation_failure(&mut self, failure: &ValidationFailure, now: Instant) {
        if self.torn_down {
            return;
        }
        self.recovery.on_validation_failure(failure, now);
    }

    /// A deadline changed outside this instance.
    pub fn apply_deadline_update(&mut self, update: &DeadlineUpdate, now: Instant) -> bool {
        if !self.live.cards.contains_key(&update.card_id) {
            return false;
        }
        self.apply(
            BoardOp::SetCardField {
                card_id: update.card_id.clone(),
                field: CardField::Deadline(update.deadline.clone()),
            },
            CommitKind::Debounced,
            now,
        )
    }

    /// Cancel all timers. Later mutations and host events are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if self.scheduler.close().is_some() {
            log::warn!("[lexera.embed.teardown] Dropped a pending debounced write");
        }
        self.recovery.cancel();
        self.reconciler.clear();
    }

    fn recover(&mut self, now: Instant) {
        log::info!(
            "[lexera.embed.recovery] Re-asserting board '{}' after validation failure",
            self.live.title
        );
        self.scheduler.cancel();
        self.write(self.live.clone(), WriteReason::Recovery, now);
    }

    fn write(&mut self, board: Board, reason: WriteReason, now: Instant) {
        let stamp = Utc::now().timestamp_millis();
        let mut attr = BoardAttribute::new(board).saved_at(stamp);
        if reason == WriteReason::Recovery {
            attr = attr.recovered_at(stamp);
        }
        let fingerprint = BoardFingerprint::of(&attr.board);
        log::info!(
            "[lexera.embed.persist] Wrote board attribute ({:?}, {})",
            reason,
            fingerprint.short()
        );
        self.scheduler.mark_persisted(&attr.board);
        self.reconciler.register_fingerprint(fingerprint, now);
        self.host.set_attribute(attr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::HostEvent;
    use crate::model::seed::seed_board;
    use crate::model::shape::parse_attribute;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn mounted_on_seed(t0: Instant) -> (BoardController<MemoryHost>, MemoryHost) {
        let stored = BoardAttribute::new(seed_board()).saved_at(1).to_value();
        let host = MemoryHost::with_value(stored);
        let controller = BoardController::mount(host.clone(), SyncConfig::default(), t0).unwrap();
        (controller, host)
    }

    fn written_board(host: &MemoryHost) -> Board {
        parse_attribute(host.last_write().as_ref()).unwrap().board
    }

    #[test]
    fn test_mount_absent_seeds_and_writes() {
        let host = MemoryHost::new();
        let controller =
            BoardController::mount(host.clone(), SyncConfig::default(), Instant::now()).unwrap();
        assert_eq!(controller.board(), &seed_board());
        assert_eq!(host.write_count(), 1);
        let attr = parse_attribute(host.last_write().as_ref()).unwrap();
        assert!(attr.last_saved_at.is_some());
        assert!(attr.recovery_marker_at.is_none());
    }

    #[test]
    fn test_mount_stored_does_not_write() {
        let (controller, host) = mounted_on_seed(Instant::now());
        assert_eq!(host.write_count(), 0);
        assert_eq!(controller.revision(), 0);
    }

    #[test]
    fn test_mount_rejects_bad_config() {
        let config = SyncConfig {
            debounce_ms: 0,
            ..SyncConfig::default()
        };
        let result = BoardController::mount(MemoryHost::new(), config, Instant::now());
        assert!(matches!(result, Err(ConfigError::ZeroDebounce)));
    }

    #[test]
    fn test_move_card_writes_immediately() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        let changed = controller.apply(
            BoardOp::MoveCard {
                card_id: "card-1".into(),
                source: "col-1".into(),
                dest: "col-3".into(),
            },
            CommitKind::Immediate,
            t0,
        );
        assert!(changed);
        assert_eq!(host.write_count(), 1);
        let written = written_board(&host);
        assert_eq!(written.columns["col-1"].card_ids, vec!["card-2"]);
        assert_eq!(written.columns["col-3"].card_ids, vec!["card-1"]);
        assert_eq!(written.cards, seed_board().cards);
    }

    #[test]
    fn test_add_card_is_visible_without_delay() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply_mutation(
            Mutation::classify(BoardOp::AddCard {
                column_id: "col-2".into(),
            }),
            t0,
        );
        assert_eq!(written_board(&host).columns["col-2"].card_ids.len(), 2);
    }

    #[test]
    fn test_noop_edit_does_not_write() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(
            BoardOp::RenameBoard {
                title: "Board".into(),
            },
            CommitKind::Immediate,
            t0,
        );
        controller.apply(
            BoardOp::MoveCard {
                card_id: "card-1".into(),
                source: "col-1".into(),
                dest: "col-1".into(),
            },
            CommitKind::Immediate,
            t0,
        );
        assert_eq!(host.write_count(), 0);
    }

    #[test]
    fn test_debounced_edits_coalesce() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        for (offset, title) in [(0, "R"), (100, "Ro"), (200, "Roadmap")] {
            controller.apply(
                BoardOp::RenameBoard {
                    title: title.into(),
                },
                CommitKind::Debounced,
                t0 + ms(offset),
            );
        }
        assert_eq!(controller.next_deadline(), Some(t0 + ms(700)));
        controller.poll(t0 + ms(699));
        assert_eq!(host.write_count(), 0);
        controller.poll(t0 + ms(700));
        assert_eq!(host.write_count(), 1);
        assert_eq!(written_board(&host).title, "Roadmap");
        controller.poll(t0 + ms(5000));
        assert_eq!(host.write_count(), 1);
    }

    #[test]
    fn test_flush_writes_pending_early() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(
            BoardOp::RenameBoard {
                title: "Draft".into(),
            },
            CommitKind::Debounced,
            t0,
        );
        controller.flush(t0 + ms(50));
        assert_eq!(host.write_count(), 1);
        assert!(!controller.has_pending_write());
        controller.poll(t0 + ms(600));
        assert_eq!(host.write_count(), 1);
    }

    #[test]
    fn test_delete_column_cascade_and_last_column_guard() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        let delete = |id: &str| BoardOp::DeleteColumn {
            column_id: id.to_string(),
        };
        assert!(controller.apply(delete("col-2"), CommitKind::Immediate, t0));
        assert!(!controller.board().cards.contains_key("card-3"));
        assert_eq!(controller.board().column_order, vec!["col-1", "col-3"]);
        assert!(controller.apply(delete("col-1"), CommitKind::Immediate, t0));
        assert!(!controller.apply(delete("col-3"), CommitKind::Immediate, t0));
        assert_eq!(controller.board().column_order, vec!["col-3"]);
        assert_eq!(host.write_count(), 2);
    }

    #[test]
    fn test_echo_of_own_write_leaves_live_untouched() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(
            BoardOp::AddColumn,
            CommitKind::Immediate,
            t0,
        );
        let revision = controller.revision();
        let echo = host.get_attribute();
        assert!(!controller.on_attribute_changed(echo.as_ref(), t0 + ms(1)));
        assert_eq!(controller.revision(), revision);
    }

    #[test]
    fn test_equal_external_value_leaves_live_untouched() {
        let t0 = Instant::now();
        let (mut controller, _host) = mounted_on_seed(t0);
        let same = BoardAttribute::new(seed_board()).saved_at(999).to_value();
        assert!(!controller.on_attribute_changed(Some(&same), t0));
        assert_eq!(controller.revision(), 0);
    }

    #[test]
    fn test_late_echo_does_not_roll_back_typing() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(BoardOp::AddColumn, CommitKind::Immediate, t0);
        let echo = host.get_attribute();
        controller.apply(
            BoardOp::RenameBoard {
                title: "Typing".into(),
            },
            CommitKind::Debounced,
            t0 + ms(10),
        );
        assert!(!controller.on_attribute_changed(echo.as_ref(), t0 + ms(20)));
        assert_eq!(controller.board().title, "Typing");
        assert!(controller.has_pending_write());
    }

    #[test]
    fn test_host_undo_is_adopted() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(BoardOp::AddColumn, CommitKind::Immediate, t0);
        // Consume our own echo first
        let echo = host.get_attribute();
        controller.on_attribute_changed(echo.as_ref(), t0);

        assert!(host.undo());
        let undone = host.get_attribute();
        assert!(controller.on_attribute_changed(undone.as_ref(), t0 + ms(5)));
        assert_eq!(controller.board(), &seed_board());
        // Adopted value counts as persisted
        controller.apply(
            BoardOp::RenameBoard {
                title: "Board".into(),
            },
            CommitKind::Immediate,
            t0 + ms(6),
        );
        assert_eq!(host.write_count(), 1);
    }

    #[test]
    fn test_undo_after_lost_notifications_is_adopted() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(BoardOp::AddColumn, CommitKind::Immediate, t0);
        controller.apply(
            BoardOp::RenameBoard { title: "X".into() },
            CommitKind::Immediate,
            t0 + ms(1),
        );
        // Neither echo was delivered; resync against what the host holds
        assert!(!controller.resync(t0 + ms(2)));
        assert_eq!(controller.board().title, "X");

        assert!(host.undo());
        let undone = host.get_attribute();
        assert!(controller.on_attribute_changed(undone.as_ref(), t0 + ms(3)));
        assert_eq!(controller.board().title, "Board");
        assert_eq!(controller.board().column_order.len(), 4);
        assert_eq!(host.write_count(), 2);
    }

    #[test]
    fn test_repaired_external_value_is_written_back() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        let mut broken = seed_board();
        if let Some(col) = broken.columns.get_mut("col-1") {
            col.card_ids.push("ghost".into());
        }
        host.replace_external(Some(BoardAttribute::new(broken).to_value()));

        let incoming = host.get_attribute();
        assert!(controller.on_attribute_changed(incoming.as_ref(), t0));
        assert_eq!(controller.board(), &seed_board());
        assert_eq!(host.write_count(), 1);
        assert_eq!(written_board(&host), seed_board());

        // Our write-back echoes as a self-write
        let echo = host.get_attribute();
        assert!(!controller.on_attribute_changed(echo.as_ref(), t0 + ms(1)));
        controller.poll(t0 + ms(5000));
        assert_eq!(host.write_count(), 1);
    }

    #[test]
    fn test_external_change_cancels_pending_write() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(
            BoardOp::RenameBoard {
                title: "Mine".into(),
            },
            CommitKind::Debounced,
            t0,
        );
        let theirs = BoardAttribute::new(crate::model::ops::add_column(&seed_board())).to_value();
        host.replace_external(Some(theirs.clone()));
        assert!(controller.on_attribute_changed(Some(&theirs), t0 + ms(10)));
        assert!(!controller.has_pending_write());
        controller.poll(t0 + ms(1000));
        assert_eq!(host.write_count(), 0);
        assert_eq!(controller.board().column_order.len(), 4);
    }

    #[test]
    fn test_malformed_external_value_reseeds() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(
            BoardOp::RenameBoard {
                title: "Mine".into(),
            },
            CommitKind::Immediate,
            t0,
        );
        let garbage = serde_json::json!({"columns": 5});
        assert!(controller.on_attribute_changed(Some(&garbage), t0 + ms(1)));
        assert_eq!(controller.board(), &seed_board());
        // Host state unknown: the next commit writes even though nothing changed
        controller.apply(
            BoardOp::RenameBoard {
                title: "Board".into(),
            },
            CommitKind::Immediate,
            t0 + ms(2),
        );
        assert_eq!(host.write_count(), 2);
    }

    #[test]
    fn test_validation_failure_recovers_with_marker() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(BoardOp::AddColumn, CommitKind::Immediate, t0);
        let good = controller.board().clone();

        controller.on_validation_failure(
            &ValidationFailure {
                node_type: "kanbanBoard".into(),
                message: "dropped".into(),
            },
            t0,
        );
        // Host dropped the node content meanwhile
        assert!(!controller.on_attribute_changed(None, t0 + ms(10)));
        assert_eq!(controller.board(), &good);

        controller.poll(t0 + ms(99));
        assert_eq!(host.write_count(), 1);
        controller.poll(t0 + ms(100));
        assert_eq!(host.write_count(), 2);
        let attr = parse_attribute(host.last_write().as_ref()).unwrap();
        assert_eq!(attr.board, good);
        assert!(attr.recovery_marker_at.is_some());

        // The recovery write's echo is not a material change
        let echo = host.get_attribute();
        assert!(!controller.on_attribute_changed(echo.as_ref(), t0 + ms(101)));
    }

    #[test]
    fn test_validation_failure_for_other_node_ignored() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.on_validation_failure(
            &ValidationFailure {
                node_type: "image".into(),
                message: "bad src".into(),
            },
            t0,
        );
        assert_eq!(controller.next_deadline(), None);
        controller.poll(t0 + ms(1000));
        assert_eq!(host.write_count(), 0);
    }

    #[test]
    fn test_deadline_update_for_rendered_card() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        let update = DeadlineUpdate {
            card_id: "card-2".into(),
            deadline: Some("2026-12-24".into()),
        };
        assert!(controller.apply_deadline_update(&update, t0));
        controller.poll(t0 + ms(500));
        assert_eq!(
            written_board(&host).cards["card-2"].deadline.as_deref(),
            Some("2026-12-24")
        );
        let unknown = DeadlineUpdate {
            card_id: "card-x".into(),
            deadline: None,
        };
        assert!(!controller.apply_deadline_update(&unknown, t0));
    }

    #[test]
    fn test_teardown_cancels_and_blocks_writes() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        controller.apply(
            BoardOp::RenameBoard {
                title: "Unsaved".into(),
            },
            CommitKind::Debounced,
            t0,
        );
        controller.teardown();
        controller.poll(t0 + ms(1000));
        assert!(!controller.apply(BoardOp::AddColumn, CommitKind::Immediate, t0));
        controller.on_validation_failure(
            &ValidationFailure {
                node_type: "kanbanBoard".into(),
                message: "late".into(),
            },
            t0,
        );
        controller.poll(t0 + ms(2000));
        assert_eq!(host.write_count(), 0);
        assert!(controller.is_torn_down());
    }

    #[test]
    fn test_writes_are_broadcast_to_subscribers() {
        let t0 = Instant::now();
        let (mut controller, host) = mounted_on_seed(t0);
        let mut rx = host.subscribe();
        controller.apply(BoardOp::AddColumn, CommitKind::Immediate, t0);
        assert!(matches!(rx.try_recv(), Ok(HostEvent::AttributeChanged(Some(_)))));
    }

    #[test]
    fn test_stats_use_default_completion_column() {
        let t0 = Instant::now();
        let (controller, _host) = mounted_on_seed(t0);
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let stats = controller.stats(today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 0);
    }
}
