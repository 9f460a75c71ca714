//! Semantic equality of board snapshots.
//!
//! The canonical key is the JSON serialization of the board alone. Bookkeeping
//! stamps (`lastSavedAt`, `recoveryMarkerAt`) live on `BoardAttribute`, outside
//! the board, so they can never influence the key. Maps are ordered, which
//! makes the key deterministic for equal boards.

pub mod diff;
pub mod fingerprint;

use crate::types::Board;

pub use diff::{diff_boards, BoardChange};
pub use fingerprint::BoardFingerprint;

pub fn canonical_key(board: &Board) -> String {
    // Strings, ordered maps and vectors always serialize.
    serde_json::to_string(board).unwrap_or_default()
}

pub fn materially_equal(a: &Board, b: &Board) -> bool {
    canonical_key(a) == canonical_key(b)
}
