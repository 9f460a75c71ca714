/// SHA-256 fingerprint of a board's canonical key.
use sha2::{Digest, Sha256};

use super::canonical_key;
use crate::types::Board;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardFingerprint(pub String);

impl BoardFingerprint {
    pub fn from_key(key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn of(board: &Board) -> Self {
        Self::from_key(&canonical_key(board))
    }

    /// First 12 hex chars, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}
