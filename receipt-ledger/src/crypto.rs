//! Hash chaining for the event log
//!
//! Each record commits to its predecessor:
//!
//! ```text
//! hash_n = SHA-256(hash_{n-1} || sequence_n || timestamp_n || bincode(event_n))
//! ```
//!
//! An indexer that holds the last hash it processed can detect any rewrite
//! of the records that follow.

use crate::events::{Event, EventRecord};
use crate::types::Timestamp;
use sha2::{Digest, Sha256};

/// Previous-hash of the first record
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Hash of one record given its predecessor
pub fn chain_hash(
    previous_hash: &[u8; 32],
    sequence: u64,
    timestamp: Timestamp,
    event: &Event,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash);
    hasher.update(sequence.to_be_bytes());
    hasher.update(timestamp.to_be_bytes());
    // Serializing a plain enum of owned fields cannot fail.
    hasher.update(bincode::serialize(event).unwrap_or_default());
    hasher.finalize().into()
}

/// Check hashes and links of a contiguous run of records
pub fn verify_chain<'a>(records: impl IntoIterator<Item = &'a EventRecord>) -> bool {
    let mut expected_previous: Option<[u8; 32]> = None;

    for record in records {
        if let Some(prev) = expected_previous {
            if record.previous_hash != prev {
                return false;
            }
        }

        let recomputed = chain_hash(
            &record.previous_hash,
            record.sequence,
            record.timestamp,
            &record.event,
        );
        if recomputed != record.hash {
            return false;
        }

        expected_previous = Some(record.hash);
    }

    true
}

/// Hex rendering for logs
pub fn hash_hex(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}
