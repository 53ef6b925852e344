//! Deterministic message identifiers.
//!
//! The id is a version-5 UUID in the URL namespace whose name is the
//! lowercase hex SHA-256 of `"<timestamp>|<chat_id>|<sender_id>|" + payload`.
//! Identical input always maps to the identical id, which is what lets the
//! platform deduplicate re-fed dumps.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Decimal text of the epoch seconds as a float value (`1609459200.0`).
///
/// Previously issued ids were computed from this rendering, so it must not change.
pub fn canonical_timestamp(epoch_timestamp: i64) -> String {
    format!("{}.0", epoch_timestamp)
}

/// Bytes hashed to obtain the id
pub fn seed(epoch_timestamp: i64, chat_id: &str, sender_id: &str, payload: &[u8]) -> Vec<u8> {
    let mut seed = format!(
        "{}|{}|{}|",
        canonical_timestamp(epoch_timestamp),
        chat_id,
        sender_id
    )
    .into_bytes();
    seed.extend_from_slice(payload);
    seed
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub fn derive(epoch_timestamp: i64, chat_id: &str, sender_id: &str, payload: &[u8]) -> Uuid {
    let digest = sha256_hex(&seed(epoch_timestamp, chat_id, sender_id, payload));
    Uuid::new_v5(&Uuid::NAMESPACE_URL, digest.as_bytes())
}
