/// Identifier generation for cards and columns.
///
/// Ids are `<prefix>-<8 hex chars>`. The hex part mixes an atomic counter with a
/// nanosecond timestamp through SHA-256, which keeps ids uniformly spread and
/// unique within a process. Uniqueness inside one board is enforced by retrying
/// against the board's existing keys.
use std::sync::atomic::{AtomicU64, Ordering};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

pub const CARD_PREFIX: &str = "card";
pub const COLUMN_PREFIX: &str = "col";

/// Generate 8 random-looking hex chars.
pub fn generate_suffix() -> String {
    use sha2::{Digest, Sha256};
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash[..4])
}

/// Generate an id with `prefix` for which `taken` returns false.
pub fn generate_unique(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = format!("{}-{}", prefix, generate_suffix());
        if !taken(&candidate) {
            return candidate;
        }
    }
}
