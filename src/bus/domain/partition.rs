//! Key-to-partition assignment.

use sha2::{Digest, Sha256};

/// Maps a partition key onto one of `partitions` partitions.
///
/// The mapping is stable across processes, so all records sharing a key
/// (by convention the correlation id) land on the same partition.
#[must_use]
pub fn partition_for_key(key: &str, partitions: u32) -> u32 {
    if partitions <= 1 {
        return 0;
    }
    let digest = Sha256::digest(key.as_bytes());
    let prefix = digest
        .iter()
        .take(4)
        .fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte));
    prefix.checked_rem(partitions).unwrap_or(0)
}
