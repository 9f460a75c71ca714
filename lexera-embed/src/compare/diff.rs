/// Card- and column-level diff between two board versions.
///
/// Used for diagnostics when an externally changed attribute replaces the live
/// board, so the log says what the host actually changed.
use std::collections::HashMap;

use crate::types::{Board, Card, CardId, ColumnId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardChange {
    TitleChanged {
        old: String,
        new: String,
    },
    ColumnAdded {
        column_id: ColumnId,
    },
    ColumnRemoved {
        column_id: ColumnId,
    },
    ColumnRenamed {
        column_id: ColumnId,
        old: String,
        new: String,
    },
    ColumnsReordered,
    CompletionColumnChanged {
        old: Option<ColumnId>,
        new: Option<ColumnId>,
    },
    CardAdded {
        card_id: CardId,
        column_id: ColumnId,
    },
    CardRemoved {
        card_id: CardId,
        column_id: ColumnId,
    },
    CardModified {
        card_id: CardId,
        fields: Vec<&'static str>,
    },
    CardMoved {
        card_id: CardId,
        old_column: ColumnId,
        new_column: ColumnId,
    },
}

/// card id -> (column id, position)
fn placement(board: &Board) -> HashMap<&str, (&str, usize)> {
    let mut map = HashMap::new();
    for col in board.columns.values() {
        for (pos, card_id) in col.card_ids.iter().enumerate() {
            map.insert(card_id.as_str(), (col.id.as_str(), pos));
        }
    }
    map
}

fn changed_fields(old: &Card, new: &Card) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if old.title != new.title {
        fields.push("title");
    }
    if old.description != new.description {
        fields.push("description");
    }
    if old.priority != new.priority {
        fields.push("priority");
    }
    if old.deadline != new.deadline {
        fields.push("deadline");
    }
    fields
}

/// Compute changes from `old_board` to `new_board`.
pub fn diff_boards(old_board: &Board, new_board: &Board) -> Vec<BoardChange> {
    let mut changes = Vec::new();

    if old_board.title != new_board.title {
        changes.push(BoardChange::TitleChanged {
            old: old_board.title.clone(),
            new: new_board.title.clone(),
        });
    }

    for (id, old_col) in &old_board.columns {
        match new_board.columns.get(id) {
            None => changes.push(BoardChange::ColumnRemoved {
                column_id: id.clone(),
            }),
            Some(new_col) if new_col.title != old_col.title => {
                changes.push(BoardChange::ColumnRenamed {
                    column_id: id.clone(),
                    old: old_col.title.clone(),
                    new: new_col.title.clone(),
                })
            }
            Some(_) => {}
        }
    }
    for id in new_board.columns.keys() {
        if !old_board.columns.contains_key(id) {
            changes.push(BoardChange::ColumnAdded {
                column_id: id.clone(),
            });
        }
    }

    // Reorder only counts among columns present in both versions.
    let kept_old: Vec<_> = old_board
        .column_order
        .iter()
        .filter(|id| new_board.columns.contains_key(*id))
        .collect();
    let kept_new: Vec<_> = new_board
        .column_order
        .iter()
        .filter(|id| old_board.columns.contains_key(*id))
        .collect();
    if kept_old != kept_new {
        changes.push(BoardChange::ColumnsReordered);
    }

    let old_done = old_board.completion_column().map(|c| c.id.clone());
    let new_done = new_board.completion_column().map(|c| c.id.clone());
    if old_done != new_done {
        changes.push(BoardChange::CompletionColumnChanged {
            old: old_done,
            new: new_done,
        });
    }

    let old_place = placement(old_board);
    let new_place = placement(new_board);

    for (card_id, (old_col, _)) in &old_place {
        match new_place.get(card_id) {
            None => changes.push(BoardChange::CardRemoved {
                card_id: card_id.to_string(),
                column_id: old_col.to_string(),
            }),
            Some((new_col, _)) => {
                if old_col != new_col {
                    changes.push(BoardChange::CardMoved {
                        card_id: card_id.to_string(),
                        old_column: old_col.to_string(),
                        new_column: new_col.to_string(),
                    });
                }
                if let (Some(old_card), Some(new_card)) = (
                    old_board.cards.get(*card_id),
                    new_board.cards.get(*card_id),
                ) {
                    let fields = changed_fields(old_card, new_card);
                    if !fields.is_empty() {
                        changes.push(BoardChange::CardModified {
                            card_id: card_id.to_string(),
                            fields,
                        });
                    }
                }
            }
        }
    }
    for (card_id, (new_col, _)) in &new_place {
        if !old_place.contains_key(card_id) {
            changes.push(BoardChange::CardAdded {
                card_id: card_id.to_string(),
                column_id: new_col.to_string(),
            });
        }
    }

    changes
}

/// One-line summary such as `cards +1 -0 ~2 moved 1; columns +0 -1`.
pub fn summarize(changes: &[BoardChange]) -> String {
    let mut added = 0;
    let mut removed = 0;
    let mut modified = 0;
    let mut moved = 0;
    let mut cols_added = 0;
    let mut cols_removed = 0;
    let mut other = 0;
    for change in changes {
        match change {
            BoardChange::CardAdded { .. } => added += 1,
            BoardChange::CardRemoved { .. } => removed += 1,
            BoardChange::CardModified { .. } => modified += 1,
            BoardChange::CardMoved { .. } => moved += 1,
            BoardChange::ColumnAdded { .. } => cols_added += 1,
            BoardChange::ColumnRemoved { .. } => cols_removed += 1,
            _ => other += 1,
        }
    }
    format!(
        "cards +{} -{} ~{} moved {}; columns +{} -{}; other {}",
        added, removed, modified, moved, cols_added, cols_removed, other
    )
}
