/// Async driver for one board instance.
///
/// A single task owns the controller and selects over:
/// - widget commands (mutations, flush, teardown)
/// - host events (attribute changes, validation failures)
/// - cross-instance deadline updates
/// - the controller's next timer deadline
///
/// Everything runs on that one task, so the board is never mutated
/// concurrently and at most one debounce timer is outstanding.
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};

use crate::controller::BoardController;
use crate::deadline_bus::{DeadlineSubscription, DeadlineUpdate};
use crate::host::{HostDocument, HostEvent};
use crate::interaction::Mutation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Apply(Mutation),
    /// Blur / Enter: write any pending edit now.
    Flush,
    Teardown,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

async fn next_deadline_update(sub: &mut Option<DeadlineSubscription>) -> Option<DeadlineUpdate> {
    match sub {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}

/// Discard queued attribute changes after a lag; the host's current value
/// supersedes them. Validation failures are still delivered.
fn drain_superseded<H: HostDocument>(
    controller: &mut BoardController<H>,
    host_events: &mut broadcast::Receiver<HostEvent>,
) {
    use broadcast::error::TryRecvError;
    loop {
        match host_events.try_recv() {
            Ok(HostEvent::AttributeChanged(_)) | Err(TryRecvError::Lagged(_)) => {}
            Ok(HostEvent::ValidationFailure(failure)) => {
                controller.on_validation_failure(&failure, now());
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

/// Run until teardown (explicit, or all command senders dropped) and return
/// the torn-down controller.
pub async fn run_session<H: HostDocument>(
    mut controller: BoardController<H>,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut host_events: broadcast::Receiver<HostEvent>,
    mut deadlines: Option<DeadlineSubscription>,
) -> BoardController<H> {
    if let Some(sub) = deadlines.as_mut() {
        sub.set_cards(controller.board().cards.keys().cloned());
    }

    loop {
        let deadline = controller.next_deadline();
        let revision = controller.revision();

        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Apply(mutation)) => {
                    controller.apply_mutation(mutation, now());
                }
                Some(SessionCommand::Flush) => controller.flush(now()),
                Some(SessionCommand::Teardown) | None => {
                    controller.teardown();
                    break;
                }
            },
            event = host_events.recv() => match event {
                Ok(HostEvent::AttributeChanged(value)) => {
                    controller.on_attribute_changed(value.as_ref(), now());
                }
                Ok(HostEvent::ValidationFailure(failure)) => {
                    controller.on_validation_failure(&failure, now());
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("[lexera.embed.session] Lagged by {} host events, resyncing", n);
                    drain_superseded(&mut controller, &mut host_events);
                    controller.resync(now());
                }
                Err(broadcast::error::RecvError::Closed) => {
                    log::info!("[lexera.embed.session] Host event channel closed");
                    controller.teardown();
                    break;
                }
            },
            update = next_deadline_update(&mut deadlines) => match update {
                Some(update) => {
                    controller.apply_deadline_update(&update, now());
                }
                None => {
                    log::debug!("[lexera.embed.session] Deadline bus closed");
                    deadlines = None;
                }
            },
            _ = sleep_until(deadline) => controller.poll(now()),
        }

        if controller.revision() != revision {
            if let Some(sub) = deadlines.as_mut() {
                sub.set_cards(controller.board().cards.keys().cloned());
            }
        }
    }

    controller
}
