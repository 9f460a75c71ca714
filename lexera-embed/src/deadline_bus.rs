/// Cross-instance deadline updates.
///
/// A card's deadline may be changed by something outside the board instance
/// rendering it (a calendar view, another editor pane). Updates go through a
/// broadcast channel; each subscription follows only the card ids its board
/// currently renders and drops everything else.
use std::collections::HashSet;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::types::CardId;

const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineUpdate {
    pub card_id: CardId,
    /// `None` clears the deadline.
    pub deadline: Option<String>,
}

#[derive(Clone)]
pub struct DeadlineBus {
    tx: broadcast::Sender<DeadlineUpdate>,
}

impl Default for DeadlineBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadlineBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an update. Returns how many subscriptions received it.
    pub fn publish(&self, update: DeadlineUpdate) -> usize {
        self.tx.send(update).unwrap_or(0)
    }

    pub fn subscribe<I>(&self, card_ids: I) -> DeadlineSubscription
    where
        I: IntoIterator<Item = CardId>,
    {
        DeadlineSubscription {
            rx: self.tx.subscribe(),
            cards: card_ids.into_iter().collect(),
        }
    }
}

pub struct DeadlineSubscription {
    rx: broadcast::Receiver<DeadlineUpdate>,
    cards: HashSet<CardId>,
}

impl DeadlineSubscription {
    /// Replace the followed card ids (call after the rendered board changes).
    pub fn set_cards<I>(&mut self, card_ids: I)
    where
        I: IntoIterator<Item = CardId>,
    {
        self.cards = card_ids.into_iter().collect();
    }

    pub fn follows(&self, card_id: &str) -> bool {
        self.cards.contains(card_id)
    }

    /// Next queued update for a followed card, without waiting.
    pub fn try_next(&mut self) -> Option<DeadlineUpdate> {
        loop {
            match self.rx.try_recv() {
                Ok(update) if self.follows(&update.card_id) => return Some(update),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(n)) => {
                    log::warn!("[lexera.embed.deadlines] Lagged by {} updates", n);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next update for a followed card. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<DeadlineUpdate> {
        loop {
            match self.rx.recv().await {
                Ok(update) if self.follows(&update.card_id) => return Some(update),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => {
                    log::warn!("[lexera.embed.deadlines] Lagged by {} updates", n);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
