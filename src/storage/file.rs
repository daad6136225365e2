//! Persistent file-backed tier.
//!
//! The value is stored as JSON in a single file. Age is taken from the file's
//! modification time rather than anything held in memory, so staleness
//! carries over across process restarts.

use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, warn};

use crate::clock::{is_stale, Clock, SystemClock};
use crate::storage::{Payload, Storage, StorageError};

/// JSON file tier.
pub struct FileStorage<T> {
    expiration: Duration,
    path: PathBuf,
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for FileStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.path)
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl<T: Payload> FileStorage<T> {
    /// Create a tier backed by `path`, aged against the system clock.
    pub fn new(expiration: Duration, path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::with_clock(expiration, path, Arc::new(SystemClock))
    }

    /// Create a tier backed by `path`, aged against `clock`.
    pub fn with_clock(
        expiration: Duration,
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StorageError::InvalidConfig(
                "file tier path must not be empty".to_string(),
            ));
        }
        if path.file_name().is_none() {
            return Err(StorageError::InvalidConfig(format!(
                "file tier path {} does not name a file",
                path.display()
            )));
        }

        Ok(Self {
            expiration,
            path,
            clock,
            _payload: PhantomData,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the backing file, or `None` if it does not exist.
    async fn modified(&self) -> Result<Option<SystemTime>, StorageError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Directory new contents are staged in before replacing the file.
    fn staging_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[async_trait]
impl<T: Payload> Storage<T> for FileStorage<T> {
    fn name(&self) -> &str {
        "file"
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn expiration(&self) -> Option<Duration> {
        Some(self.expiration)
    }

    async fn is_expired(&self) -> bool {
        match self.modified().await {
            Ok(Some(modified)) => is_stale(modified, self.clock.now(), self.expiration),
            Ok(None) => !self.expiration.is_zero(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot stat tier file");
                true
            }
        }
    }

    async fn read(&self) -> Result<Option<T>, StorageError> {
        let Some(modified) = self.modified().await? else {
            debug!(path = %self.path.display(), "Tier file missing");
            return Ok(None);
        };

        if is_stale(modified, self.clock.now(), self.expiration) {
            debug!(path = %self.path.display(), "Tier file expired");
            return Ok(None);
        }

        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            // Removed between the stat and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice(&data)?;

        debug!(path = %self.path.display(), size = data.len(), "Read tier file");
        Ok(Some(value))
    }

    async fn write(&self, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_vec(value)?;

        let dir = self.staging_dir();
        fs::create_dir_all(&dir).await?;

        // One staging file per write; concurrent writers must not share it.
        let target = self.path.clone();
        let size = data.len();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut staged = NamedTempFile::new_in(&dir)?;
            staged.write_all(&data)?;
            staged.as_file().sync_all()?;
            staged.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(path = %self.path.display(), size, "Wrote tier file");
        Ok(())
    }
}
