//! Interaction layer: turns user gestures into board operations.
//!
//! Each gesture state machine is independent and produces at most one
//! `Mutation`, which carries both the operation and how it must be persisted.

pub mod confirm;
pub mod deadline;
pub mod drag;

use crate::model::{BoardOp, CardField};
use crate::persist::CommitKind;
use crate::types::{CardId, ColumnId, Priority};

pub use confirm::{CardDeleteConfirms, ColumnDeleteConfirm, Confirm};
pub use deadline::DeadlineEditor;
pub use drag::DragState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub op: BoardOp,
    pub kind: CommitKind,
}

impl Mutation {
    pub fn immediate(op: BoardOp) -> Self {
        Self {
            op,
            kind: CommitKind::Immediate,
        }
    }

    pub fn debounced(op: BoardOp) -> Self {
        Self {
            op,
            kind: CommitKind::Debounced,
        }
    }

    /// Structural operations and discrete selections are immediate, typed
    /// field edits debounced.
    pub fn classify(op: BoardOp) -> Self {
        let discrete = matches!(
            op,
            BoardOp::SetCardField {
                field: CardField::Priority(_),
                ..
            }
        );
        if op.is_structural() || discrete {
            Self::immediate(op)
        } else {
            Self::debounced(op)
        }
    }

    /// Priority picker selection.
    pub fn priority(card_id: impl Into<CardId>, priority: Priority) -> Self {
        Self::classify(BoardOp::SetCardField {
            card_id: card_id.into(),
            field: CardField::Priority(priority),
        })
    }
}

/// The editable text fields of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextTarget {
    BoardTitle,
    ColumnTitle(ColumnId),
    CardTitle(CardId),
    CardDescription(CardId),
}

/// How a text value reached the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCommit {
    /// Typing while the field keeps focus.
    Keystroke,
    /// Focus left the field.
    Blur,
    /// Explicit commit key.
    Enter,
}

/// Build the mutation for a text edit. Keystrokes are debounced; blur and
/// Enter commit immediately and so flush any pending keystroke write.
pub fn text_edit(target: TextTarget, value: String, commit: TextCommit) -> Mutation {
    let op = match target {
        TextTarget::BoardTitle => BoardOp::RenameBoard { title: value },
        TextTarget::ColumnTitle(column_id) => BoardOp::RenameColumn {
            column_id,
            title: value,
        },
        TextTarget::CardTitle(card_id) => BoardOp::SetCardField {
            card_id,
            field: CardField::Title(value),
        },
        TextTarget::CardDescription(card_id) => BoardOp::SetCardField {
            card_id,
            field: CardField::Description(value),
        },
    };
    match commit {
        TextCommit::Keystroke => Mutation::debounced(op),
        TextCommit::Blur | TextCommit::Enter => Mutation::immediate(op),
    }
}
