//! Key-to-shard routing.

use xxhash_rust::xxh64::xxh64;

/// Maps a key to one of `shard_count` shards.
///
/// Uses 64-bit xxHash (seed 0), which is uniform enough to spread load and
/// much cheaper than a keyed hasher. `shard_count` must be non-zero.
#[inline]
pub fn shard_index(key: &str, shard_count: usize) -> usize {
    (xxh64(key.as_bytes(), 0) % shard_count as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_index_is_deterministic() {
        assert_eq!(shard_index("user:42", 128), shard_index("user:42", 128));
    }

    #[test]
    fn test_shard_index_in_range() {
        for i in 0..1_000 {
            let key = format!("key-{i}");
            assert!(shard_index(&key, 7) < 7);
        }
        assert_eq!(shard_index("anything", 1), 0);
    }

    #[test]
    fn test_shard_index_spreads_keys() {
        let shard_count = 16;
        let mut counts = vec![0usize; shard_count];
        for i in 0..16_000 {
            counts[shard_index(&format!("key-{i}"), shard_count)] += 1;
        }

        // Roughly 1000 per shard; allow generous slack
        for count in counts {
            assert!(count > 700 && count < 1_300, "unbalanced shard: {count}");
        }
    }
}
