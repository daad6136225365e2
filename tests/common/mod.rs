//! Shared test tiers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chain_resource::storage::{Storage, StorageError};

/// In-memory tier that counts every call and can be told to fail.
pub struct CountingStorage {
    name: String,
    read_only: bool,
    fail_reads: bool,
    fail_writes: bool,
    value: RwLock<Option<u32>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingStorage {
    pub fn new(name: &str, value: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            read_only: false,
            fail_reads: false,
            fail_writes: false,
            value: RwLock::new(value),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Write attempts, including rejected ones.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> Option<u32> {
        *self.value.read().await
    }
}

#[async_trait]
impl Storage<u32> for CountingStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn expiration(&self) -> Option<Duration> {
        None
    }

    async fn is_expired(&self) -> bool {
        false
    }

    async fn read(&self) -> Result<Option<u32>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(StorageError::Io(std::io::Error::other("injected read failure")));
        }
        Ok(*self.value.read().await)
    }

    async fn write(&self, value: &u32) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.read_only {
            return Err(StorageError::ReadOnly {
                tier: self.name.clone(),
            });
        }
        if self.fail_writes {
            return Err(StorageError::Io(std::io::Error::other("injected write failure")));
        }
        *self.value.write().await = Some(*value);
        Ok(())
    }
}

/// Erase a list of counting tiers into chain input, keeping handles for assertions.
pub fn as_chain_input(tiers: &[Arc<CountingStorage>]) -> Vec<Arc<dyn Storage<u32>>> {
    tiers
        .iter()
        .map(|t| t.clone() as Arc<dyn Storage<u32>>)
        .collect()
}
