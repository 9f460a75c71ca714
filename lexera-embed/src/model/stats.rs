/// Read-only statistics shown in the board header.
use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{Board, Card, ColumnId};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProgress {
    pub column_id: ColumnId,
    pub title: String,
    pub card_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    /// Non-completion columns in display order.
    pub progress: Vec<ColumnProgress>,
    pub with_deadline: usize,
    pub overdue: usize,
}

impl BoardStats {
    /// `fallback_completion` names the column counted as done when no column
    /// carries the completion flag.
    pub fn compute(board: &Board, fallback_completion: &str, today: NaiveDate) -> Self {
        let completion_id = board
            .completion_column()
            .map(|c| c.id.as_str())
            .unwrap_or(fallback_completion);

        let completed = board
            .columns
            .get(completion_id)
            .map_or(0, |c| c.card_ids.len());

        let progress = board
            .ordered_columns()
            .into_iter()
            .filter(|c| c.id != completion_id)
            .map(|c| ColumnProgress {
                column_id: c.id.clone(),
                title: c.title.clone(),
                card_count: c.card_ids.len(),
            })
            .collect();

        let with_deadline = board.cards.values().filter(|c| c.deadline.is_some()).count();
        let overdue = board
            .cards
            .values()
            .filter(|c| is_overdue(c, today))
            .count();

        Self {
            total: board.card_count(),
            completed,
            progress,
            with_deadline,
            overdue,
        }
    }
}

pub fn parse_deadline(deadline: &str) -> Option<NaiveDate> {
    // Accept full timestamps too; only the calendar date matters.
    let date_part = deadline.get(..10).unwrap_or(deadline);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// A deadline is overdue when its date is strictly before `today`.
pub fn is_overdue(card: &Card, today: NaiveDate) -> bool {
    card.deadline
        .as_deref()
        .and_then(parse_deadline)
        .is_some_and(|date| date < today)
}
