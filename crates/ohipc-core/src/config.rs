//! Transport configuration.

use std::time::Duration;

use ohipc_errors::{IpcError, IpcResult};
use serde::{Deserialize, Serialize};

use crate::parcel::{CYCLE_LIMIT, DEFAULT_MAX_PARCEL_SIZE};

/// Upper bound on worker threads.
pub const MAX_WORKER_THREADS: usize = 64;

/// Smallest parcel able to carry a token and a few arguments.
pub const MIN_PARCEL_SIZE: usize = 256;

/// Configuration of the in-process transport.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ohipc_core::TransportConfig;
///
/// let config = TransportConfig::builder()
///     .worker_threads(2)
///     .sync_timeout(Duration::from_millis(500))
///     .build()?;
/// assert_eq!(config.max_collection_len, 2000);
/// # Ok::<(), ohipc_errors::IpcError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Number of worker threads delivering requests.
    pub worker_threads: usize,
    /// How long a synchronous call waits for its reply.
    pub sync_timeout: Duration,
    /// Largest parcel accepted, in bytes.
    pub max_parcel_size: usize,
    /// Largest element count accepted for a bulk argument.
    pub max_collection_len: usize,
    /// Capacity of the request queue.
    pub queue_capacity: usize,
    /// Prefix of worker thread names.
    pub thread_name_prefix: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            sync_timeout: Duration::from_secs(5),
            max_parcel_size: DEFAULT_MAX_PARCEL_SIZE,
            max_collection_len: CYCLE_LIMIT,
            queue_capacity: 256,
            thread_name_prefix: "ohipc-worker".to_string(),
        }
    }
}

impl TransportConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::InvalidConfig`] naming the first invalid field.
    pub fn validate(&self) -> IpcResult<()> {
        if self.worker_threads == 0 || self.worker_threads > MAX_WORKER_THREADS {
            return Err(IpcError::InvalidConfig(format!(
                "worker_threads must be between 1 and {MAX_WORKER_THREADS}, got {}",
                self.worker_threads
            )));
        }
        if self.sync_timeout.is_zero() {
            return Err(IpcError::InvalidConfig(
                "sync_timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_parcel_size < MIN_PARCEL_SIZE {
            return Err(IpcError::InvalidConfig(format!(
                "max_parcel_size must be at least {MIN_PARCEL_SIZE} bytes"
            )));
        }
        if self.max_collection_len == 0 || self.max_collection_len > CYCLE_LIMIT {
            return Err(IpcError::InvalidConfig(format!(
                "max_collection_len must be between 1 and {CYCLE_LIMIT}"
            )));
        }
        if self.queue_capacity == 0 {
            return Err(IpcError::InvalidConfig(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err(IpcError::InvalidConfig(
                "thread_name_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::InvalidConfig`] on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> IpcResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| IpcError::InvalidConfig(format!("malformed transport config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the number of worker threads.
    #[must_use]
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the synchronous call timeout.
    #[must_use]
    pub fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.config.sync_timeout = timeout;
        self
    }

    /// Set the largest accepted parcel.
    #[must_use]
    pub fn max_parcel_size(mut self, bytes: usize) -> Self {
        self.config.max_parcel_size = bytes;
        self
    }

    /// Set the bulk argument limit.
    #[must_use]
    pub fn max_collection_len(mut self, len: usize) -> Self {
        self.config.max_collection_len = len;
        self
    }

    /// Set the request queue capacity.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> IpcResult<TransportConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
