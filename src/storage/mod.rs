//! Storage tiers.
//!
//! A tier is one backend in the resolution chain. Every tier implements
//! [`Storage`]:
//! - [`memory`]: volatile in-process tier with its own last-write timestamp
//! - [`file`]: persistent JSON file tier, aged by the file's modification time
//! - [`web`]: read-only remote fetch tier
//!
//! `read` distinguishes absence (`Ok(None)`) from failure (`Err`). The chain
//! treats both as "fall through to the next tier", but failures are logged
//! and counted so an outage does not look like an empty cache.

pub mod file;
pub mod memory;
pub mod web;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use web::WebServiceStorage;

/// Types that can move through a chain of tiers.
pub trait Payload: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage tier '{tier}' is read-only")]
    ReadOnly { tier: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid tier configuration: {0}")]
    InvalidConfig(String),
}

/// One tier of a resolution chain.
#[async_trait]
pub trait Storage<T: Payload>: Send + Sync {
    /// Tier name used in logs and metrics.
    fn name(&self) -> &str;

    /// Read-only tiers supply values but never receive propagated writes.
    fn is_read_only(&self) -> bool;

    /// Maximum age of a stored value, or `None` if the tier has no notion of staleness.
    fn expiration(&self) -> Option<Duration>;

    /// Whether the tier's last update is older than its expiration.
    async fn is_expired(&self) -> bool;

    /// Fetch the current value. `Ok(None)` means nothing usable is stored
    /// (never written, missing, or expired).
    async fn read(&self) -> Result<Option<T>, StorageError>;

    /// Store a value.
    ///
    /// The default rejects the write; writable tiers override it.
    async fn write(&self, _value: &T) -> Result<(), StorageError> {
        Err(StorageError::ReadOnly {
            tier: self.name().to_string(),
        })
    }
}
