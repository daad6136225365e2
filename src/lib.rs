//! chain-resource: ordered multi-tier value resolution.
//!
//! A value is read from the first tier in a priority chain that can supply it,
//! then written back into every writable tier so later reads stay cheap:
//!   memory (volatile) → file (persistent) → web service (read-only)

pub mod chain;
pub mod clock;
pub mod config;
pub mod exchange_rate;
pub mod metrics;
pub mod storage;

use std::sync::Arc;

use chain::ChainResource;
use config::Config;
use storage::{FileStorage, MemoryStorage, Payload, Storage, WebServiceStorage};

/// Assemble the standard memory → file → web chain described by `config`.
pub fn assemble_chain<T: Payload>(config: &Config) -> anyhow::Result<ChainResource<T>> {
    let memory: Arc<dyn Storage<T>> = Arc::new(MemoryStorage::new(config.memory.expiration()));
    let file: Arc<dyn Storage<T>> = Arc::new(FileStorage::new(
        config.file.expiration(),
        config.file.path.clone(),
    )?);
    let web: Arc<dyn Storage<T>> = Arc::new(WebServiceStorage::new(
        &config.web.url,
        config.web.app_id.as_deref(),
        config.web.request_timeout(),
    )?);

    Ok(ChainResource::new(vec![memory, file, web])?)
}
