//! Volatile in-memory tier.
//!
//! Holds at most one value together with the time it was written. Both live
//! in a single lock-protected slot, so a concurrent reader sees either the
//! old pair or the new pair, never a mix.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::clock::{is_stale, Clock, SystemClock};
use crate::storage::{Payload, Storage, StorageError};

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    updated_at: SystemTime,
}

/// In-process tier. Contents are lost when the process exits.
pub struct MemoryStorage<T> {
    expiration: Duration,
    slot: RwLock<Option<Slot<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T> std::fmt::Debug for MemoryStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("expiration", &self.expiration)
            .field("clock", &self.clock)
            .finish()
    }
}

impl<T: Payload> MemoryStorage<T> {
    /// Create an empty tier aged against the system clock.
    pub fn new(expiration: Duration) -> Self {
        Self::with_clock(expiration, Arc::new(SystemClock))
    }

    /// Create an empty tier aged against `clock`.
    pub fn with_clock(expiration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            expiration,
            slot: RwLock::new(None),
            clock,
        }
    }

    /// Drop the stored value.
    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }

    /// When the stored value was last written, if any.
    pub async fn last_updated(&self) -> Option<SystemTime> {
        self.slot.read().await.as_ref().map(|slot| slot.updated_at)
    }

    fn slot_is_stale(&self, slot: &Slot<T>) -> bool {
        is_stale(slot.updated_at, self.clock.now(), self.expiration)
    }
}

#[async_trait]
impl<T: Payload> Storage<T> for MemoryStorage<T> {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn expiration(&self) -> Option<Duration> {
        Some(self.expiration)
    }

    async fn is_expired(&self) -> bool {
        match self.slot.read().await.as_ref() {
            Some(slot) => self.slot_is_stale(slot),
            // Never written: there is no fresh value to serve.
            None => !self.expiration.is_zero(),
        }
    }

    async fn read(&self) -> Result<Option<T>, StorageError> {
        let guard = self.slot.read().await;
        match guard.as_ref() {
            Some(slot) if !self.slot_is_stale(slot) => Ok(Some(slot.value.clone())),
            Some(_) => {
                debug!(tier = "memory", "Stored value expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn write(&self, value: &T) -> Result<(), StorageError> {
        let updated_at = self.clock.now();
        *self.slot.write().await = Some(Slot {
            value: value.clone(),
            updated_at,
        });
        Ok(())
    }
}
