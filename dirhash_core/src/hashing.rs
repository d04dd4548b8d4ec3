//! Hash calculation for the dirhash engine
//!
//! Per-file digests are produced by streaming file contents through one of
//! the registered algorithms. Per-file digests are then folded into a single
//! aggregate digest per directory job (see [`AggregateBuilder`]).

use crate::{
    Error, Result,
    error::{IoError, ValidationError},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

mod aggregate;
mod algorithms;
mod registry;
mod traits;

pub use aggregate::AggregateBuilder;
pub use registry::AlgorithmRegistry;
pub use traits::{HashAlgorithmExt, HashAlgorithmImpl, StreamingHasher};

/// Default read buffer size for streaming file contents
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Hash algorithms supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (default, matches the digests the C client expects)
    #[default]
    MD5,
    /// SHA1
    SHA1,
    /// CRC32
    CRC32,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::MD5 => write!(f, "md5"),
            HashAlgorithm::SHA1 => write!(f, "sha1"),
            HashAlgorithm::CRC32 => write!(f, "crc32"),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::MD5),
            "sha1" => Ok(HashAlgorithm::SHA1),
            "crc32" => Ok(HashAlgorithm::CRC32),
            _ => Err(Error::Validation(ValidationError::invalid_configuration(
                &format!(
                    "Unknown hash algorithm: {s} (supported: {})",
                    AlgorithmRegistry::global().list().join(", ")
                ),
            ))),
        }
    }
}

impl HashAlgorithmExt for HashAlgorithm {
    fn to_impl(&self) -> Arc<dyn HashAlgorithmImpl> {
        match AlgorithmRegistry::global().get(&self.to_string()) {
            Some(algorithm) => algorithm,
            // Every enum variant is registered by `register_all`
            None => unreachable!("hash algorithm {self} is not registered"),
        }
    }
}

/// Fixed-size output of a hash function
///
/// Rendered as uppercase hexadecimal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Uppercase hexadecimal rendering
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Parse an uppercase or lowercase hexadecimal digest
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| hex.get(i..i + 2).and_then(|b| u8::from_str_radix(b, 16).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Digest)
    }
}

impl From<&[u8]> for Digest {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

/// Result of hashing one file
#[derive(Debug, Clone)]
pub struct HashResult {
    pub algorithm: HashAlgorithm,
    pub digest: Digest,
    pub input_size: u64,
}

/// Streaming hash calculator
#[derive(Debug, Clone)]
pub struct HashCalculator {
    algorithm: HashAlgorithm,
    buffer_size: usize,
}

impl HashCalculator {
    /// Create a calculator for the given algorithm with the default buffer size
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self::with_buffer_size(algorithm, DEFAULT_READ_BUFFER_SIZE)
    }

    /// Create a calculator with a custom read buffer size
    pub fn with_buffer_size(algorithm: HashAlgorithm, buffer_size: usize) -> Self {
        Self {
            algorithm,
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Calculate hash for byte data
    pub fn calculate_bytes(&self, data: &[u8]) -> HashResult {
        HashResult {
            algorithm: self.algorithm,
            digest: self.algorithm.to_impl().hash_bytes(data),
            input_size: data.len() as u64,
        }
    }

    /// Calculate hash for anything readable, in `buffer_size` chunks
    pub fn calculate_reader<R: Read>(&self, reader: &mut R) -> std::io::Result<HashResult> {
        let mut hasher = self.algorithm.to_impl().create_hasher();
        let mut buffer = vec![0u8; self.buffer_size];
        let mut input_size = 0u64;

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
            input_size += read as u64;
        }

        Ok(HashResult {
            algorithm: self.algorithm,
            digest: hasher.finalize(),
            input_size,
        })
    }

    /// Calculate hash for a file without loading it entirely into memory
    pub fn calculate_file(&self, file_path: &Path) -> Result<HashResult> {
        let mut file = File::open(file_path)
            .map_err(|e| Error::Io(IoError::from_std(e).with_path(file_path)))?;
        self.calculate_reader(&mut file)
            .map_err(|e| Error::Io(IoError::from_std(e).with_path(file_path)))
    }
}

impl Default for HashCalculator {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}
