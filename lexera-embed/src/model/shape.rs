/// Schema-validating parse of the opaque host attribute.
///
/// The host hands back whatever it stored, so nothing is trusted: the value
/// must be an object carrying a string `title`, an object `columns`, an object
/// `cards` and an array `columnOrder`. Anything else is a shape error and the
/// caller falls back to the seed board. A value with the right shape but broken
/// references (dangling card ids, unordered columns) is repaired in place.
use std::collections::HashSet;

use serde_json::Value;

use super::ops::normalize_deadline;
use super::seed::seed_board;
use crate::types::{Board, BoardAttribute};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("attribute is absent")]
    Absent,

    #[error("attribute is not an object")]
    NotAnObject,

    #[error("field `{0}` is missing or has the wrong type")]
    BadField(&'static str),

    #[error("malformed board: {0}")]
    Malformed(String),

    #[error("board has no columns")]
    NoColumns,
}

/// How a board was obtained from an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Stored value was valid as-is.
    Stored,
    /// Stored value had the right shape; `repairs` reference fixes were applied.
    Repaired { repairs: usize },
    /// Stored value was unusable; the seed board was used instead.
    Seeded(ShapeError),
}

#[derive(Debug, Clone)]
pub struct LoadedBoard {
    pub board: Board,
    pub source: LoadSource,
}

impl LoadedBoard {
    pub fn is_seeded(&self) -> bool {
        matches!(self.source, LoadSource::Seeded(_))
    }
}

/// Validate the top-level shape and deserialize.
pub fn parse_attribute(value: Option<&Value>) -> Result<BoardAttribute, ShapeError> {
    let value = match value {
        None | Some(Value::Null) => return Err(ShapeError::Absent),
        Some(v) => v,
    };
    let obj = value.as_object().ok_or(ShapeError::NotAnObject)?;

    let checks: [(&'static str, fn(&Value) -> bool); 4] = [
        ("title", Value::is_string),
        ("columns", Value::is_object),
        ("cards", Value::is_object),
        ("columnOrder", Value::is_array),
    ];
    for (field, ok) in checks {
        if !obj.get(field).is_some_and(ok) {
            return Err(ShapeError::BadField(field));
        }
    }

    serde_json::from_value::<BoardAttribute>(value.clone())
        .map_err(|e| ShapeError::Malformed(e.to_string()))
}

/// Parse, repair, or fall back to the seed board. Never fails.
pub fn load_board(value: Option<&Value>) -> LoadedBoard {
    match parse_attribute(value) {
        Ok(attr) => {
            let mut board = attr.board;
            let repairs = repair(&mut board);
            if board.columns.is_empty() {
                return seeded(ShapeError::NoColumns);
            }
            LoadedBoard {
                board,
                source: if repairs == 0 {
                    LoadSource::Stored
                } else {
                    LoadSource::Repaired { repairs }
                },
            }
        }
        Err(e) => seeded(e),
    }
}

fn seeded(err: ShapeError) -> LoadedBoard {
    LoadedBoard {
        board: seed_board(),
        source: LoadSource::Seeded(err),
    }
}

/// Restore the referential invariants of a shape-valid board.
/// Returns the number of fixes applied.
pub fn repair(board: &mut Board) -> usize {
    let mut repairs = 0;

    for (key, col) in board.columns.iter_mut() {
        if &col.id != key {
            col.id = key.clone();
            repairs += 1;
        }
    }
    for (key, card) in board.cards.iter_mut() {
        if &card.id != key {
            card.id = key.clone();
            repairs += 1;
        }
        let normalized = normalize_deadline(card.deadline.take());
        card.deadline = normalized;
    }

    // Column order: drop unknown and duplicate entries, append unordered columns.
    let mut seen = HashSet::new();
    let before = board.column_order.len();
    let columns = &board.columns;
    board
        .column_order
        .retain(|id| columns.contains_key(id) && seen.insert(id.clone()));
    repairs += before - board.column_order.len();
    for key in board.columns.keys() {
        if !seen.contains(key) {
            board.column_order.push(key.clone());
            repairs += 1;
        }
    }

    // Card references: each card belongs to the first column (in display
    // order) that mentions it, and must exist.
    let mut referenced = HashSet::new();
    for col_id in board.column_order.clone() {
        if let Some(col) = board.columns.get_mut(&col_id) {
            let before = col.card_ids.len();
            let cards = &board.cards;
            col.card_ids
                .retain(|id| cards.contains_key(id) && referenced.insert(id.clone()));
            repairs += before - col.card_ids.len();
        }
    }
    let before = board.cards.len();
    board.cards.retain(|id, _| referenced.contains(id));
    repairs += before - board.cards.len();

    // Keep only the first completion flag in display order.
    let mut flag_seen = false;
    for col_id in &board.column_order {
        if let Some(col) = board.columns.get_mut(col_id) {
            if col.is_completion_column {
                if flag_seen {
                    col.is_completion_column = false;
                    repairs += 1;
                }
                flag_seen = true;
            }
        }
    }

    repairs
}
