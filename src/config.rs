//! Configuration for Undis
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, UndisError};

/// Prompt written to the client before every line read
pub const DEFAULT_PROMPT: &str = "undis > ";

/// Main configuration for an Undis server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Snapshot file loaded at startup and written at shutdown
    pub snapshot_path: PathBuf,

    // -------------------------------------------------------------------------
    // Worker Pool Configuration
    // -------------------------------------------------------------------------
    /// Workers kept alive even when idle
    pub pool_min_workers: usize,

    /// Hard upper bound on workers (one per live connection)
    pub pool_max_workers: usize,

    /// How long a worker above the minimum may sit idle before it is reclaimed
    pub pool_idle_timeout: Duration,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Capacity of the per-connection line buffer (in bytes)
    pub session_buffer_size: usize,

    /// Prompt sent before every command line
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("undis.db"),
            pool_min_workers: 1,
            pool_max_workers: 10,
            pool_idle_timeout: Duration::from_secs(5),
            listen_addr: "0.0.0.0:8080".to_string(),
            session_buffer_size: 64 * 1024, // 64 KB
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the pool and buffer sizing make sense
    pub fn validate(&self) -> Result<()> {
        if self.pool_max_workers == 0 {
            return Err(UndisError::Config(
                "pool_max_workers must be at least 1".to_string(),
            ));
        }
        if self.pool_min_workers > self.pool_max_workers {
            return Err(UndisError::Config(format!(
                "pool_min_workers ({}) exceeds pool_max_workers ({})",
                self.pool_min_workers, self.pool_max_workers
            )));
        }
        if self.session_buffer_size < 2 {
            return Err(UndisError::Config(
                "session_buffer_size must hold at least a line terminator".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the snapshot file path
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    /// Set the minimum number of pool workers
    pub fn pool_min_workers(mut self, count: usize) -> Self {
        self.config.pool_min_workers = count;
        self
    }

    /// Set the maximum number of pool workers
    pub fn pool_max_workers(mut self, count: usize) -> Self {
        self.config.pool_max_workers = count;
        self
    }

    /// Set the idle timeout after which surplus workers are reclaimed
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the per-connection buffer capacity (in bytes)
    pub fn session_buffer_size(mut self, size: usize) -> Self {
        self.config.session_buffer_size = size;
        self
    }

    /// Set the prompt text
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
