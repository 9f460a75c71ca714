/// Deadline editor: display ⇄ editing.
///
/// Confirming or blurring applies the draft as a debounced field edit. An empty
/// draft means "no deadline".
use super::Mutation;
use crate::model::{BoardOp, CardField};
use crate::types::CardId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeadlineEditor {
    #[default]
    Display,
    Editing { card_id: CardId, draft: String },
}

impl DeadlineEditor {
    pub fn begin(&mut self, card_id: impl Into<CardId>, current: Option<&str>) {
        *self = DeadlineEditor::Editing {
            card_id: card_id.into(),
            draft: current.unwrap_or_default().to_string(),
        };
    }

    /// Update the date-entry draft. Ignored outside editing.
    pub fn input(&mut self, value: &str) {
        if let DeadlineEditor::Editing { draft, .. } = self {
            *draft = value.to_string();
        }
    }

    pub fn confirm(&mut self) -> Option<Mutation> {
        match std::mem::take(self) {
            DeadlineEditor::Editing { card_id, draft } => {
                let deadline = Some(draft).filter(|d| !d.trim().is_empty());
                Some(Mutation::debounced(BoardOp::SetCardField {
                    card_id,
                    field: CardField::Deadline(deadline),
                }))
            }
            DeadlineEditor::Display => None,
        }
    }

    /// Losing focus commits like confirm.
    pub fn blur(&mut self) -> Option<Mutation> {
        self.confirm()
    }

    /// Clear the value and commit "no deadline".
    pub fn clear(&mut self) -> Option<Mutation> {
        self.input("");
        self.confirm()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, DeadlineEditor::Editing { .. })
    }
}
