//! Core traits for the hash algorithm extensibility system

use super::Digest;
use std::sync::Arc;

/// Core trait that all hash algorithms must implement
pub trait HashAlgorithmImpl: Send + Sync {
    /// Unique identifier for this algorithm
    fn id(&self) -> &'static str;

    /// Create a new streaming hasher instance
    fn create_hasher(&self) -> Box<dyn StreamingHasher>;

    /// Calculate hash for in-memory data
    fn hash_bytes(&self, data: &[u8]) -> Digest {
        let mut hasher = self.create_hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Length of the produced digest in bytes
    fn digest_len(&self) -> usize;
}

/// Trait for streaming hash calculation
pub trait StreamingHasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash calculation and return the result
    fn finalize(self: Box<Self>) -> Digest;
}

/// Extension trait for HashAlgorithm enum to provide adapter to the registry
pub trait HashAlgorithmExt {
    /// Convert enum to trait implementation
    fn to_impl(&self) -> Arc<dyn HashAlgorithmImpl>;
}
