//! Thread-pool configuration.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `workers` | available CPU parallelism |
//! | `thread_name_prefix` | `"adeferred-worker"` |
//! | `thread_stack_size` | 2 MiB |

use serde::{Deserialize, Serialize};

/// Error produced when validating a [`PoolConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The worker count was zero.
    #[error("worker count must be at least 1")]
    NoWorkers,
    /// The thread name prefix was empty.
    #[error("thread name prefix must not be empty")]
    EmptyNamePrefix,
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn default_name_prefix() -> String {
    "adeferred-worker".to_string()
}

const fn default_stack_size() -> usize {
    2 * 1024 * 1024
}

/// Configuration for a [`ThreadPool`](super::ThreadPool).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Name prefix for worker threads; the worker index is appended.
    #[serde(default = "default_name_prefix")]
    pub thread_name_prefix: String,
    /// Stack size per worker thread, in bytes.
    #[serde(default = "default_stack_size")]
    pub thread_stack_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            thread_name_prefix: default_name_prefix(),
            thread_stack_size: default_stack_size(),
        }
    }
}

impl PoolConfig {
    /// Creates a configuration with the default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the worker stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::EmptyNamePrefix);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.workers >= 1);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = PoolConfig::new().with_workers(0);
        assert_eq!(config.validate(), Err(ConfigError::NoWorkers));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let config = PoolConfig::new().with_thread_name_prefix("");
        assert_eq!(config.validate(), Err(ConfigError::EmptyNamePrefix));
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: PoolConfig =
            serde_json::from_str(r#"{ "workers": 3 }"#).expect("config should parse");
        assert_eq!(config.workers, 3);
        assert_eq!(config.thread_name_prefix, "adeferred-worker");
        assert_eq!(config.thread_stack_size, 2 * 1024 * 1024);
    }
}
