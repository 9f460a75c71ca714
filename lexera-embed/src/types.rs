use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ColumnId = String;
pub type CardId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    /// ISO calendar date (`YYYY-MM-DD`). Absent means "no deadline".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub card_ids: Vec<CardId>,
    /// Only feeds the completion statistic. At most one column per board carries it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_completion_column: bool,
}

/// The entity graph backing one embedded board.
///
/// Maps are ordered so that serializing the same board always yields the same
/// bytes; display order lives in `column_order` and `Column::card_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub title: String,
    pub column_order: Vec<ColumnId>,
    pub columns: BTreeMap<ColumnId, Column>,
    pub cards: BTreeMap<CardId, Card>,
}

impl Board {
    /// Columns in display order. Order entries without a column are skipped.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
            .collect()
    }

    /// The column currently holding `card_id`.
    pub fn column_of(&self, card_id: &str) -> Option<&Column> {
        self.columns
            .values()
            .find(|col| col.card_ids.iter().any(|id| id == card_id))
    }

    /// The flagged completion column, if any.
    pub fn completion_column(&self) -> Option<&Column> {
        self.columns.values().find(|col| col.is_completion_column)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

/// Persisted shape of the host attribute: the board plus bookkeeping stamps.
///
/// `last_saved_at` and `recovery_marker_at` are epoch milliseconds. They never
/// take part in equality checks (see `compare::canonical_key`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardAttribute {
    #[serde(flatten)]
    pub board: Board,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_marker_at: Option<i64>,
}

impl BoardAttribute {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            last_saved_at: None,
            recovery_marker_at: None,
        }
    }

    pub fn saved_at(mut self, millis: i64) -> Self {
        self.last_saved_at = Some(millis);
        self
    }

    pub fn recovered_at(mut self, millis: i64) -> Self {
        self.recovery_marker_at = Some(millis);
        self
    }

    /// Serialize into the opaque JSON value handed to the host.
    pub fn to_value(&self) -> serde_json::Value {
        // A struct of strings, maps and integers always serializes.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
