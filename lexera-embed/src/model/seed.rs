use std::collections::BTreeMap;

use crate::types::{Board, Card, Column, Priority};

pub const DEFAULT_BOARD_TITLE: &str = "Board";
pub const DEFAULT_COLUMN_TITLE: &str = "New column";
pub const DEFAULT_CARD_TITLE: &str = "New card";

/// The board a freshly inserted node starts with, and the fallback for any
/// attribute value that fails shape validation.
pub fn seed_board() -> Board {
    let columns = [
        ("col-1", "To do", vec!["card-1", "card-2"], false),
        ("col-2", "In progress", vec!["card-3"], false),
        ("col-3", "Done", vec![], true),
    ];
    let cards = [
        ("card-1", "Plan the week", Priority::Medium),
        ("card-2", "Collect ideas", Priority::Low),
        ("card-3", "Draft the first post", Priority::High),
    ];

    Board {
        title: DEFAULT_BOARD_TITLE.to_string(),
        column_order: columns.iter().map(|(id, ..)| id.to_string()).collect(),
        columns: columns
            .into_iter()
            .map(|(id, title, card_ids, done)| {
                (
                    id.to_string(),
                    Column {
                        id: id.to_string(),
                        title: title.to_string(),
                        card_ids: card_ids.into_iter().map(str::to_string).collect(),
                        is_completion_column: done,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>(),
        cards: cards
            .into_iter()
            .map(|(id, title, priority)| {
                (
                    id.to_string(),
                    Card {
                        id: id.to_string(),
                        title: title.to_string(),
                        description: String::new(),
                        priority,
                        deadline: None,
                    },
                )
            })
            .collect(),
    }
}

pub fn default_card(id: String) -> Card {
    Card {
        id,
        title: DEFAULT_CARD_TITLE.to_string(),
        description: String::new(),
        priority: Priority::None,
        deadline: None,
    }
}

pub fn default_column(id: String) -> Column {
    Column {
        id,
        title: DEFAULT_COLUMN_TITLE.to_string(),
        card_ids: Vec::new(),
        is_completion_column: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ops::check_invariants;

    #[test]
    fn test_seed_layout() {
        let board = seed_board();
        assert_eq!(board.column_order, vec!["col-1", "col-2", "col-3"]);
        assert_eq!(board.columns["col-1"].card_ids, vec!["card-1", "card-2"]);
        assert_eq!(board.columns["col-2"].card_ids, vec!["card-3"]);
        assert!(board.columns["col-3"].card_ids.is_empty());
        assert_eq!(board.cards.len(), 3);
    }

    #[test]
    fn test_seed_is_consistent() {
        assert!(check_invariants(&seed_board()).is_ok());
    }
}
