/// Drag/move gesture: idle → dragging(card, source) → idle.
use super::Mutation;
use crate::model::BoardOp;
use crate::types::{CardId, ColumnId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { card_id: CardId, source: ColumnId },
}

impl DragState {
    pub fn start(&mut self, card_id: impl Into<CardId>, source: impl Into<ColumnId>) {
        *self = DragState::Dragging {
            card_id: card_id.into(),
            source: source.into(),
        };
    }

    /// Drop on `dest`. Yields a move only when `dest` differs from the source.
    pub fn drop_on(&mut self, dest: &str) -> Option<Mutation> {
        match std::mem::take(self) {
            DragState::Dragging { card_id, source } if source != dest => {
                Some(Mutation::immediate(BoardOp::MoveCard {
                    card_id,
                    source,
                    dest: dest.to_string(),
                }))
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}
