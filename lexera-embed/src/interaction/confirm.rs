/// Two-step delete confirmation for columns and cards.
use std::collections::HashMap;

use super::Mutation;
use crate::model::BoardOp;
use crate::types::{Board, CardId, ColumnId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Confirm<T> {
    #[default]
    Idle,
    Pending(T),
}

impl<T> Confirm<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Confirm::Pending(_))
    }
}

/// Column deletion: idle → pending(column) → confirm | cancel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDeleteConfirm {
    state: Confirm<ColumnId>,
}

impl ColumnDeleteConfirm {
    /// Ask to delete `column_id`. Refused (returns false, state unchanged) when
    /// it is the board's only column or does not exist.
    pub fn request(&mut self, board: &Board, column_id: &str) -> bool {
        if board.column_order.len() <= 1 || !board.columns.contains_key(column_id) {
            return false;
        }
        self.state = Confirm::Pending(column_id.to_string());
        true
    }

    pub fn confirm(&mut self) -> Option<Mutation> {
        match std::mem::take(&mut self.state) {
            Confirm::Pending(column_id) => {
                Some(Mutation::immediate(BoardOp::DeleteColumn { column_id }))
            }
            Confirm::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = Confirm::Idle;
    }

    pub fn pending(&self) -> Option<&str> {
        match &self.state {
            Confirm::Pending(id) => Some(id),
            Confirm::Idle => None,
        }
    }
}

/// Card deletion, one independent confirmation per card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDeleteConfirms {
    /// card id -> column holding it when deletion was requested
    pending: HashMap<CardId, ColumnId>,
}

impl CardDeleteConfirms {
    pub fn request(&mut self, card_id: &str, column_id: &str) {
        self.pending
            .insert(card_id.to_string(), column_id.to_string());
    }

    pub fn confirm(&mut self, card_id: &str) -> Option<Mutation> {
        self.pending
            .remove(card_id)
            .map(|column_id| {
                Mutation::immediate(BoardOp::DeleteCard {
                    column_id,
                    card_id: card_id.to_string(),
                })
            })
    }

    pub fn cancel(&mut self, card_id: &str) {
        self.pending.remove(card_id);
    }

    pub fn state(&self, card_id: &str) -> Confirm<&str> {
        match self.pending.get(card_id) {
            Some(column_id) => Confirm::Pending(column_id.as_str()),
            None => Confirm::Idle,
        }
    }

    /// Forget confirmations for cards no longer on the board.
    pub fn retain_existing(&mut self, board: &Board) {
        self.pending.retain(|card_id, _| board.cards.contains_key(card_id));
    }
}
