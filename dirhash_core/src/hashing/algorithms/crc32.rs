//! CRC32 hash algorithm implementation
//!
//! Not collision resistant; useful for quick change detection on large trees.

use crate::hashing::Digest;
use crate::hashing::traits::{HashAlgorithmImpl, StreamingHasher};
use crc32fast::Hasher as Crc32Hasher;

pub struct Crc32Algorithm;

/// CRC32 streaming hasher
struct Crc32StreamingHasher {
    hasher: Crc32Hasher,
}

impl StreamingHasher for Crc32StreamingHasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> Digest {
        // Big-endian so the hex rendering matches the conventional CRC32 form
        Digest::from(&self.hasher.finalize().to_be_bytes()[..])
    }
}

impl HashAlgorithmImpl for Crc32Algorithm {
    fn id(&self) -> &'static str {
        "crc32"
    }

    fn create_hasher(&self) -> Box<dyn StreamingHasher> {
        Box::new(Crc32StreamingHasher {
            hasher: Crc32Hasher::new(),
        })
    }

    fn digest_len(&self) -> usize {
        4
    }
}
