use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::error::{MistError, MistResult};
use crate::types::ArchiveFormat;

/// Chunk size used when neither the config nor the CLI overrides it.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Largest block the IPFS block API accepts.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 1024 * 1024;

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MistConfig {
    pub store: StoreConfig,
    pub archive: ArchiveConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// IPFS daemon HTTP API
    #[default]
    Ipfs,
    /// Local directory via OpenDAL fs service
    Fs,
    /// S3-compatible endpoint via OpenDAL
    S3,
    /// Process-local memory (tests and dry runs)
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// IPFS HTTP API base URL
    pub ipfs_api: String,
    /// Root directory for the fs backend
    pub root: PathBuf,
    /// S3 endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// S3 bucket name
    pub bucket: String,
    /// Key prefix for blocks inside the bucket or directory
    pub prefix: String,
    /// Refuse plaintext HTTP S3 endpoints
    pub enforce_tls: bool,
    /// Largest block the store accepts, in bytes
    pub max_block_size: usize,
    /// Per-request timeout for the IPFS backend
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Chunk size in bytes
    pub block_size: usize,
    /// Layout written by `vaporize`
    pub format: ArchiveFormat,
    /// Concurrent block fetches during `condense` (0 = sequential)
    pub fetch_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Ipfs,
            ipfs_api: "http://127.0.0.1:5001".into(),
            root: PathBuf::from("~/.local/share/mist/blocks"),
            endpoint: "http://localhost:8333".into(),
            region: "us-east-1".into(),
            bucket: "mist".into(),
            prefix: "mist".into(),
            enforce_tls: false,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            request_timeout_secs: 60,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            format: ArchiveFormat::Ctr,
            fetch_concurrency: 8,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl ArchiveConfig {
    /// Validated chunk size. Zero is rejected.
    pub fn block_size(&self) -> MistResult<NonZeroUsize> {
        NonZeroUsize::new(self.block_size)
            .ok_or_else(|| MistError::Config("archive.block_size must be positive".into()))
    }
}

impl MistConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> MistResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| MistError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn to_toml(&self) -> MistResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MistError::Config(format!("serializing config: {e}")))
    }
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[store]
backend = "s3"
endpoint = "https://s3.example.com:8333"
region = "us-west-2"
bucket = "archives"
prefix = "team"
enforce_tls = true
max_block_size = 4194304

[archive]
block_size = 65536
format = "sealed"
fetch_concurrency = 16

[log]
level = "debug"
format = "json"
"#;
        let config: MistConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.store.backend, StoreBackend::S3);
        assert_eq!(config.store.endpoint, "https://s3.example.com:8333");
        assert_eq!(config.store.bucket, "archives");
        assert!(config.store.enforce_tls);
        assert_eq!(config.store.max_block_size, 4 * 1024 * 1024);
        assert_eq!(config.archive.block_size, 65536);
        assert_eq!(config.archive.format, ArchiveFormat::Sealed);
        assert_eq!(config.archive.fetch_concurrency, 16);
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config: MistConfig = toml::from_str("").unwrap();

        assert_eq!(config.store.backend, StoreBackend::Ipfs);
        assert_eq!(config.store.ipfs_api, "http://127.0.0.1:5001");
        assert_eq!(config.store.max_block_size, DEFAULT_MAX_BLOCK_SIZE);
        assert_eq!(config.archive.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.archive.format, ArchiveFormat::Ctr);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[store]
backend = "fs"
root = "/srv/blocks"
"#;
        let config: MistConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.store.backend, StoreBackend::Fs);
        assert_eq!(config.store.root, PathBuf::from("/srv/blocks"));
        assert_eq!(config.store.prefix, "mist");
        assert_eq!(config.archive.block_size, DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let cfg = ArchiveConfig {
            block_size: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.block_size(), Err(MistError::Config(_))));
        assert_eq!(ArchiveConfig::default().block_size().unwrap().get(), 1024);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result: Result<MistConfig, _> = toml::from_str("[store]\nbackend = \"ftp\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = MistConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.archive.block_size, DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn test_load_and_serialize_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = MistConfig::default();
        config.archive.format = ArchiveFormat::Chain;
        config.store.backend = StoreBackend::Memory;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = MistConfig::load(&path).unwrap();
        assert_eq!(loaded.archive.format, ArchiveFormat::Chain);
        assert_eq!(loaded.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[archive\nblock_size = ").unwrap();
        assert!(matches!(MistConfig::load(&path), Err(MistError::Config(_))));
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/etc/mist/config.toml");
        assert_eq!(expand_tilde(plain), plain.to_path_buf());

        let expanded = expand_tilde(Path::new("~/blocks"));
        assert!(expanded.ends_with("blocks"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
