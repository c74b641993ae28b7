//! Configuration for the point-of-sale service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Point-of-sale configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP listen address (gateway)
    pub http_listen_addr: String,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Write mailbox configuration
    pub mailbox: MailboxConfig,

    /// Default-data provisioning configuration
    pub seed: SeedConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/truck"),
            service_name: "truck-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            http_listen_addr: "0.0.0.0:8080".to_string(),
            rocksdb: RocksDbConfig::default(),
            mailbox: MailboxConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,       // 64 MB
            max_write_buffer_number: 4,
            target_file_size_mb: 64,        // 64 MB
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Mailbox configuration for the single-writer actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Bounded mailbox capacity (applies backpressure when full)
    pub capacity: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

/// Configuration for the one-shot default catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Stock assigned to each item in the default catalog
    pub default_stock: u32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            default_stock: crate::seed::DEFAULT_SEED_STOCK,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("TRUCK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(addr) = std::env::var("TRUCK_HTTP_ADDR") {
            config.http_listen_addr = addr;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "truck-core");
        assert_eq!(config.http_listen_addr, "0.0.0.0:8080");
        assert_eq!(config.mailbox.capacity, 1000);
        assert_eq!(config.seed.default_stock, 50);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truck.toml");
        let config = Config {
            data_dir: PathBuf::from("/var/lib/truck"),
            seed: SeedConfig { default_stock: 25 },
            ..Config::default()
        };
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.data_dir, PathBuf::from("/var/lib/truck"));
        assert_eq!(loaded.rocksdb.write_buffer_size_mb, 64);
        assert_eq!(loaded.seed.default_stock, 25);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truck.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}
