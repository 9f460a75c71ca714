/// Pure board mutations.
///
/// Every operation takes a board and returns the next board. Unknown or stale
/// ids never fail: the operation becomes a no-op and the input is returned
/// unchanged, so a UI holding an outdated reference cannot corrupt the model.
use std::collections::HashSet;

use super::identity::{generate_unique, CARD_PREFIX, COLUMN_PREFIX};
use super::seed::{default_card, default_column};
use crate::types::{Board, CardId, ColumnId, Priority};

/// A single editable card field with its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardField {
    Title(String),
    Description(String),
    Priority(Priority),
    /// `None` or a blank string clears the deadline.
    Deadline(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardOp {
    RenameBoard {
        title: String,
    },
    RenameColumn {
        column_id: ColumnId,
        title: String,
    },
    SetCardField {
        card_id: CardId,
        field: CardField,
    },
    AddCard {
        column_id: ColumnId,
    },
    DeleteCard {
        column_id: ColumnId,
        card_id: CardId,
    },
    MoveCard {
        card_id: CardId,
        source: ColumnId,
        dest: ColumnId,
    },
    AddColumn,
    DeleteColumn {
        column_id: ColumnId,
    },
    SetCompletionColumn {
        column_id: ColumnId,
    },
}

impl BoardOp {
    pub fn apply(&self, board: &Board) -> Board {
        match self {
            BoardOp::RenameBoard { title } => rename_board(board, title),
            BoardOp::RenameColumn { column_id, title } => rename_column(board, column_id, title),
            BoardOp::SetCardField { card_id, field } => set_card_field(board, card_id, field.clone()),
            BoardOp::AddCard { column_id } => add_card(board, column_id),
            BoardOp::DeleteCard { column_id, card_id } => delete_card(board, column_id, card_id),
            BoardOp::MoveCard {
                card_id,
                source,
                dest,
            } => move_card(board, card_id, source, dest),
            BoardOp::AddColumn => add_column(board),
            BoardOp::DeleteColumn { column_id } => delete_column(board, column_id),
            BoardOp::SetCompletionColumn { column_id } => set_completion_column(board, column_id),
        }
    }

    /// Structural operations change the shape of the board (membership,
    /// ordering, flags) and are always persisted without delay. Text and
    /// field edits are incremental; whether they wait for the debounce window
    /// depends on how the edit was committed.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            BoardOp::RenameBoard { .. } | BoardOp::RenameColumn { .. } | BoardOp::SetCardField { .. }
        )
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            BoardOp::RenameBoard { .. } => "rename_board",
            BoardOp::RenameColumn { .. } => "rename_column",
            BoardOp::SetCardField { .. } => "set_card_field",
            BoardOp::AddCard { .. } => "add_card",
            BoardOp::DeleteCard { .. } => "delete_card",
            BoardOp::MoveCard { .. } => "move_card",
            BoardOp::AddColumn => "add_column",
            BoardOp::DeleteColumn { .. } => "delete_column",
            BoardOp::SetCompletionColumn { .. } => "set_completion_column",
        }
    }
}

pub fn rename_board(board: &Board, title: &str) -> Board {
    let mut next = board.clone();
    next.title = title.to_string();
    next
}

pub fn rename_column(board: &Board, column_id: &str, title: &str) -> Board {
    let mut next = board.clone();
    if let Some(col) = next.columns.get_mut(column_id) {
        col.title = title.to_string();
    }
    next
}

pub fn set_card_field(board: &Board, card_id: &str, field: CardField) -> Board {
    let mut next = board.clone();
    let Some(card) = next.cards.get_mut(card_id) else {
        return next;
    };
    match field {
        CardField::Title(title) => card.title = title,
        CardField::Description(description) => card.description = description,
        CardField::Priority(priority) => card.priority = priority,
        CardField::Deadline(deadline) => card.deadline = normalize_deadline(deadline),
    }
    next
}

/// Blank deadlines mean "no deadline".
pub fn normalize_deadline(deadline: Option<String>) -> Option<String> {
    deadline
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

pub fn add_card(board: &Board, column_id: &str) -> Board {
    let mut next = board.clone();
    if !next.columns.contains_key(column_id) {
        return next;
    }
    let id = generate_unique(CARD_PREFIX, |candidate| next.cards.contains_key(candidate));
    next.cards.insert(id.clone(), default_card(id.clone()));
    if let Some(col) = next.columns.get_mut(column_id) {
        col.card_ids.push(id);
    }
    next
}

pub fn delete_card(board: &Board, column_id: &str, card_id: &str) -> Board {
    let mut next = board.clone();
    let Some(col) = next.columns.get_mut(column_id) else {
        return next;
    };
    let before = col.card_ids.len();
    col.card_ids.retain(|id| id != card_id);
    if col.card_ids.len() != before {
        next.cards.remove(card_id);
    }
    next
}

/// Moves always land at the end of the destination column.
pub fn move_card(board: &Board, card_id: &str, source: &str, dest: &str) -> Board {
    let mut next = board.clone();
    if source == dest || !next.columns.contains_key(dest) {
        return next;
    }
    let Some(src) = next.columns.get_mut(source) else {
        return next;
    };
    let Some(pos) = src.card_ids.iter().position(|id| id == card_id) else {
        return next;
    };
    let moved = src.card_ids.remove(pos);
    if let Some(dst) = next.columns.get_mut(dest) {
        dst.card_ids.push(moved);
    }
    next
}

pub fn add_column(board: &Board) -> Board {
    let mut next = board.clone();
    let id = generate_unique(COLUMN_PREFIX, |candidate| next.columns.contains_key(candidate));
    next.columns.insert(id.clone(), default_column(id.clone()));
    next.column_order.push(id);
    next
}

/// Refused when `column_id` is the only column left.
pub fn delete_column(board: &Board, column_id: &str) -> Board {
    let mut next = board.clone();
    if next.columns.len() <= 1 || next.column_order.len() <= 1 {
        return next;
    }
    let Some(col) = next.columns.remove(column_id) else {
        return next;
    };
    next.column_order.retain(|id| id != column_id);
    for card_id in &col.card_ids {
        next.cards.remove(card_id);
    }
    next
}

pub fn set_completion_column(board: &Board, column_id: &str) -> Board {
    let mut next = board.clone();
    if !next.columns.contains_key(column_id) {
        return next;
    }
    for col in next.columns.values_mut() {
        col.is_completion_column = col.id == column_id;
    }
    next
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("board has no columns")]
    NoColumns,

    #[error("column order entry {0} has no column")]
    OrphanOrderEntry(ColumnId),

    #[error("column {0} is missing from the column order")]
    UnorderedColumn(ColumnId),

    #[error("column {0} appears more than once in the column order")]
    DuplicateOrderEntry(ColumnId),

    #[error("column stored under key {key} carries id {id}")]
    ColumnKeyMismatch { key: ColumnId, id: ColumnId },

    #[error("card {card_id} in column {column_id} does not exist")]
    DanglingCardRef { column_id: ColumnId, card_id: CardId },

    #[error("card {0} is referenced more than once")]
    DuplicateCardRef(CardId),

    #[error("card {0} belongs to no column")]
    OrphanCard(CardId),

    #[error("card stored under key {key} carries id {id}")]
    CardKeyMismatch { key: CardId, id: CardId },

    #[error("{0} columns are flagged as completion column")]
    MultipleCompletionColumns(usize),
}

/// Verify the referential invariants of a board, reporting the first violation.
pub fn check_invariants(board: &Board) -> Result<(), InvariantViolation> {
    if board.columns.is_empty() {
        return Err(InvariantViolation::NoColumns);
    }

    let mut ordered = HashSet::new();
    for id in &board.column_order {
        if !board.columns.contains_key(id) {
            return Err(InvariantViolation::OrphanOrderEntry(id.clone()));
        }
        if !ordered.insert(id.as_str()) {
            return Err(InvariantViolation::DuplicateOrderEntry(id.clone()));
        }
    }

    let mut referenced = HashSet::new();
    for (key, col) in &board.columns {
        if key != &col.id {
            return Err(InvariantViolation::ColumnKeyMismatch {
                key: key.clone(),
                id: col.id.clone(),
            });
        }
        if !ordered.contains(key.as_str()) {
            return Err(InvariantViolation::UnorderedColumn(key.clone()));
        }
        for card_id in &col.card_ids {
            if !board.cards.contains_key(card_id) {
                return Err(InvariantViolation::DanglingCardRef {
                    column_id: key.clone(),
                    card_id: card_id.clone(),
                });
            }
            if !referenced.insert(card_id.as_str()) {
                return Err(InvariantViolation::DuplicateCardRef(card_id.clone()));
            }
        }
    }

    for (key, card) in &board.cards {
        if key != &card.id {
            return Err(InvariantViolation::CardKeyMismatch {
                key: key.clone(),
                id: card.id.clone(),
            });
        }
        if !referenced.contains(key.as_str()) {
            return Err(InvariantViolation::OrphanCard(key.clone()));
        }
    }

    let flagged = board.columns.values().filter(|c| c.is_completion_column).count();
    if flagged > 1 {
        return Err(InvariantViolation::MultipleCompletionColumns(flagged));
    }
    Ok(())
}
