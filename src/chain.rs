//! Chain resolver: orchestrates reads and write-back across ordered tiers.
//!
//! Tiers are checked strictly in order. The first tier to supply a value
//! wins, and that value is then written into every writable tier (including
//! the one that supplied it) so later reads are served from the cheapest one.
//! Propagation is best effort: a failed write is logged and skipped, and never
//! affects the value returned to the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::ChainMetrics;
use crate::storage::{Payload, Storage, StorageError};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("a chain needs at least one storage tier")]
    Empty,
}

/// A tier as seen by the chain, classified once at construction.
///
/// Propagation only ever touches [`Tier::Writable`], so a read-only tier
/// cannot receive a write from the chain.
pub enum Tier<T: Payload> {
    Writable(Arc<dyn Storage<T>>),
    ReadOnly(Arc<dyn Storage<T>>),
}

impl<T: Payload> Tier<T> {
    fn classify(storage: Arc<dyn Storage<T>>) -> Self {
        if storage.is_read_only() {
            Tier::ReadOnly(storage)
        } else {
            Tier::Writable(storage)
        }
    }

    /// The underlying storage.
    pub fn storage(&self) -> &Arc<dyn Storage<T>> {
        match self {
            Tier::Writable(s) | Tier::ReadOnly(s) => s,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Tier::ReadOnly(_))
    }

    pub fn name(&self) -> &str {
        self.storage().name()
    }
}

impl<T: Payload> std::fmt::Debug for Tier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Writable(s) => f.debug_tuple("Writable").field(&s.name()).finish(),
            Tier::ReadOnly(s) => f.debug_tuple("ReadOnly").field(&s.name()).finish(),
        }
    }
}

/// Outcome of writing a value back into the writable tiers.
#[derive(Debug, Default)]
pub struct PropagationReport {
    /// Tiers that accepted the write, in chain order.
    pub written: Vec<String>,
    /// Tiers whose write failed, in chain order.
    pub failed: Vec<(String, StorageError)>,
}

impl PropagationReport {
    /// Whether every writable tier accepted the value.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A resolved value together with where it came from.
#[derive(Debug)]
pub struct Resolved<T> {
    pub value: T,
    /// Index in the chain of the tier that supplied the value.
    pub source_index: usize,
    /// Name of the tier that supplied the value.
    pub source: String,
    pub propagation: PropagationReport,
}

/// Ordered, fixed sequence of tiers. Lower index is checked first.
pub struct ChainResource<T: Payload> {
    tiers: Vec<Tier<T>>,
    metrics: Option<ChainMetrics>,
}

impl<T: Payload> ChainResource<T> {
    /// Build a chain from tiers in priority order.
    pub fn new(storages: Vec<Arc<dyn Storage<T>>>) -> Result<Self, ChainError> {
        if storages.is_empty() {
            return Err(ChainError::Empty);
        }

        let tiers: Vec<Tier<T>> = storages.into_iter().map(Tier::classify).collect();

        info!(
            tiers = ?tiers.iter().map(|t| t.name()).collect::<Vec<_>>(),
            writable = tiers.iter().filter(|t| !t.is_read_only()).count(),
            "Chain assembled"
        );

        Ok(Self {
            tiers,
            metrics: None,
        })
    }

    /// Record resolution outcomes into `metrics`.
    pub fn with_metrics(mut self, metrics: ChainMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Tiers in priority order.
    pub fn tiers(&self) -> &[Tier<T>] {
        &self.tiers
    }

    /// Number of tiers in the chain.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always false: construction rejects empty chains.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Resolve the value from the first tier that has one, then propagate it.
    ///
    /// Returns `None` only when every tier is absent (or failed).
    pub async fn get_value(&self) -> Option<T> {
        self.resolve().await.map(|resolved| resolved.value)
    }

    /// Like [`get_value`](Self::get_value), but also reports the supplying
    /// tier and the propagation outcome.
    pub async fn resolve(&self) -> Option<Resolved<T>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            let storage = tier.storage();
            match storage.read().await {
                Ok(Some(value)) => {
                    debug!(tier = %storage.name(), index, "Tier hit");
                    if let Some(m) = &self.metrics {
                        m.record_hit(storage.name());
                    }

                    let propagation = self.propagate(&value).await;
                    return Some(Resolved {
                        value,
                        source_index: index,
                        source: storage.name().to_string(),
                        propagation,
                    });
                }
                Ok(None) => {
                    debug!(tier = %storage.name(), index, "Tier miss");
                }
                Err(e) => {
                    warn!(tier = %storage.name(), index, error = %e, "Tier read failed, falling through");
                    if let Some(m) = &self.metrics {
                        m.record_read_error(storage.name());
                    }
                }
            }
        }

        debug!(tiers = self.tiers.len(), "No tier supplied a value");
        if let Some(m) = &self.metrics {
            m.record_miss();
        }
        None
    }

    /// Write `value` into every writable tier, in chain order.
    ///
    /// A failure on one tier does not stop the remaining writes.
    pub async fn propagate(&self, value: &T) -> PropagationReport {
        let mut report = PropagationReport::default();

        for tier in &self.tiers {
            let Tier::Writable(storage) = tier else {
                continue;
            };

            match storage.write(value).await {
                Ok(()) => {
                    debug!(tier = %storage.name(), "Propagated value");
                    report.written.push(storage.name().to_string());
                }
                Err(e) => {
                    warn!(tier = %storage.name(), error = %e, "Propagation write failed");
                    if let Some(m) = &self.metrics {
                        m.record_write_failure(storage.name());
                    }
                    report.failed.push((storage.name().to_string(), e));
                }
            }
        }

        report
    }
}

impl<T: Payload> std::fmt::Debug for ChainResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainResource")
            .field("tiers", &self.tiers)
            .finish()
    }
}
