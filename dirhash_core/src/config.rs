//! Engine configuration
//!
//! Layered with figment: defaults, then an optional TOML file named by
//! `DIRHASH_CONFIG`, then `DIRHASH_*` environment variables.

use crate::Result;
use crate::hashing::{DEFAULT_READ_BUFFER_SIZE, HashAlgorithm};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_PATH_ENV: &str = "DIRHASH_CONFIG";

/// Prefix for configuration overrides taken from the environment
pub const ENV_PREFIX: &str = "DIRHASH_";

const MIN_READ_BUFFER: usize = 4 * 1024;
const MAX_READ_BUFFER: usize = 16 * 1024 * 1024;
const MAX_WORKER_THREADS: usize = 64;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Digest algorithm for per-file and aggregate digests
    pub algorithm: HashAlgorithm,
    /// Read buffer size used when streaming file contents
    pub read_buffer_size: usize,
    /// Follow symbolic links while walking
    pub follow_links: bool,
    /// Threads in the worker runtime
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::MD5,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            follow_links: false,
            worker_threads: 2,
        }
    }
}

impl EngineConfig {
    /// Create a test configuration
    pub fn test() -> Self {
        Self {
            read_buffer_size: MIN_READ_BUFFER,
            worker_threads: 1,
            ..Self::default()
        }
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::from_figment(Self::figment(path.as_deref()).merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Defaults plus the given TOML file when it exists
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_path
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Extract and normalize a configuration from any figment
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        Ok(config.normalized())
    }

    /// Clamp numeric settings into supported ranges
    pub fn normalized(mut self) -> Self {
        self.read_buffer_size = self.read_buffer_size.clamp(MIN_READ_BUFFER, MAX_READ_BUFFER);
        self.worker_threads = self.worker_threads.clamp(1, MAX_WORKER_THREADS);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_figment(EngineConfig::figment(None)).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.algorithm, HashAlgorithm::MD5);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dirhash.toml");
        std::fs::write(&path, "algorithm = \"sha1\"\nfollow_links = true\n").unwrap();

        let config = EngineConfig::from_figment(EngineConfig::figment(Some(&path))).unwrap();
        assert_eq!(config.algorithm, HashAlgorithm::SHA1);
        assert!(config.follow_links);
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = EngineConfig::from_figment(EngineConfig::figment(Some(Path::new(
            "/no/such/dirhash.toml",
        ))))
        .unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_values_are_clamped() {
        let figment = EngineConfig::figment(None)
            .merge(Serialized::default("read_buffer_size", 1usize))
            .merge(Serialized::default("worker_threads", 1000usize));
        let config = EngineConfig::from_figment(figment).unwrap();
        assert_eq!(config.read_buffer_size, MIN_READ_BUFFER);
        assert_eq!(config.worker_threads, MAX_WORKER_THREADS);
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let figment =
            EngineConfig::figment(None).merge(Serialized::default("algorithm", "whirlpool"));
        assert!(EngineConfig::from_figment(figment).is_err());
    }
}
