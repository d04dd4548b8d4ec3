//! Aggregate digest over the per-file digests of a directory tree
//!
//! Entries are sorted by relative path before folding, so the result depends
//! only on which files exist (by relative path) and what they contain, never
//! on the order in which they were discovered.

use super::{Digest, HashAlgorithm, HashAlgorithmExt};

/// Collects `(relative path, digest)` pairs and folds them into one digest
#[derive(Debug, Clone)]
pub struct AggregateBuilder {
    algorithm: HashAlgorithm,
    entries: Vec<(Vec<u8>, Digest)>,
    total_bytes: u64,
}

impl AggregateBuilder {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            entries: Vec::new(),
            total_bytes: 0,
        }
    }

    /// Record one file. `relative_path` must use `/` as separator.
    pub fn add(&mut self, relative_path: impl AsRef<[u8]>, digest: Digest, size: u64) {
        self.entries.push((relative_path.as_ref().to_vec(), digest));
        self.total_bytes += size;
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Fold all recorded entries into the aggregate digest
    ///
    /// The input to the final hash is `path \0 HEX \n` per entry in path order.
    pub fn finish(mut self) -> Digest {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = self.algorithm.to_impl().create_hasher();
        for (path, digest) in &self.entries {
            hasher.update(path);
            hasher.update(&[0]);
            hasher.update(digest.to_hex().as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashCalculator;
    use proptest::prelude::*;

    fn digest_of(data: &[u8]) -> Digest {
        HashCalculator::new(HashAlgorithm::MD5).calculate_bytes(data).digest
    }

    fn aggregate(entries: &[(&str, &[u8])]) -> Digest {
        let mut builder = AggregateBuilder::new(HashAlgorithm::MD5);
        for (path, data) in entries {
            builder.add(*path, digest_of(data), data.len() as u64);
        }
        builder.finish()
    }

    #[test]
    fn test_empty_tree_is_deterministic() {
        assert_eq!(aggregate(&[]), aggregate(&[]));
        assert_eq!(aggregate(&[]).as_bytes().len(), 16);
    }

    #[test]
    fn test_content_change_changes_aggregate() {
        let d1 = aggregate(&[("a.txt", b"x"), ("b.txt", b"y")]);
        let d2 = aggregate(&[("a.txt", b"x"), ("b.txt", b"z")]);
        assert_ne!(d1, d2);
    }

    #[test]
    fn test_add_and_remove_change_aggregate() {
        let base = aggregate(&[("a.txt", b"x")]);
        let added = aggregate(&[("a.txt", b"x"), ("c.txt", b"")]);
        assert_ne!(base, added);
        assert_ne!(base, aggregate(&[]));
    }

    #[test]
    fn test_rename_changes_aggregate_deterministically() {
        let original = aggregate(&[("a.txt", b"x")]);
        let renamed = aggregate(&[("renamed.txt", b"x")]);
        assert_ne!(original, renamed);
        assert_eq!(renamed, aggregate(&[("renamed.txt", b"x")]));
    }

    #[test]
    fn test_counts_and_bytes() {
        let mut builder = AggregateBuilder::new(HashAlgorithm::MD5);
        builder.add("a", digest_of(b"abc"), 3);
        builder.add("b", digest_of(b"de"), 2);
        assert_eq!(builder.file_count(), 2);
        assert_eq!(builder.total_bytes(), 5);
    }

    proptest! {
        #[test]
        fn prop_discovery_order_does_not_matter(
            files in prop::collection::btree_map("[a-z]{1,8}(/[a-z]{1,8})?", prop::collection::vec(any::<u8>(), 0..64), 1..12),
            seed in any::<u64>(),
        ) {
            let entries: Vec<(String, Vec<u8>)> = files.into_iter().collect();

            let mut forward = AggregateBuilder::new(HashAlgorithm::MD5);
            for (path, data) in &entries {
                forward.add(path.clone(), digest_of(data), data.len() as u64);
            }

            // Deterministic shuffle driven by the seed
            let mut shuffled = entries.clone();
            let len = shuffled.len();
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                shuffled.swap(i, (state >> 33) as usize % (i + 1));
            }

            let mut backward = AggregateBuilder::new(HashAlgorithm::MD5);
            for (path, data) in &shuffled {
                backward.add(path.clone(), digest_of(data), data.len() as u64);
            }

            prop_assert_eq!(forward.finish(), backward.finish());
        }
    }
}
