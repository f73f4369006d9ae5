//! Process-lifetime cache of materialized codebook tables.
//!
//! Tables are keyed by `(bits, device)`. Both dimensions are tiny, so the
//! cache is unbounded and never evicts. Concurrent first use of one key may
//! generate the table more than once, but only the first insert is
//! published and every caller observes that same `Arc`.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::Codebook;
use crate::error::Result;

/// Execution device a table is materialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// Host memory (default).
    #[default]
    Cpu,
    /// Logical accelerator ordinal. Each ordinal keeps its own copy.
    Accelerator(u16),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Accelerator(ordinal) => write!(f, "accel:{ordinal}"),
        }
    }
}

/// Single-precision centroid and boundary tables for one `(bits, device)`.
#[derive(Debug)]
pub struct CodebookTables {
    bits: u8,
    device: Device,
    centroids: Arc<[f32]>,
    boundaries: Arc<[f32]>,
}

impl CodebookTables {
    #[allow(clippy::cast_possible_truncation)] // Reason: tables are f32 by contract
    fn materialize(codebook: &Codebook, device: Device) -> Self {
        Self {
            bits: codebook.bits(),
            device,
            centroids: codebook.centroids().iter().map(|&c| c as f32).collect(),
            boundaries: codebook.boundaries().iter().map(|&b| b as f32).collect(),
        }
    }

    /// Bit-width of these tables.
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Device these tables were materialized for.
    #[must_use]
    pub fn device(&self) -> Device {
        self.device
    }

    /// Ascending centroids.
    #[must_use]
    pub fn centroids(&self) -> &[f32] {
        &self.centroids
    }

    /// Ascending bucket boundaries.
    #[must_use]
    pub fn boundaries(&self) -> &[f32] {
        &self.boundaries
    }
}

/// Memoizes [`CodebookTables`] per `(bits, device)`.
///
/// Passed explicitly into each quantization stage; share one instance
/// with `Arc` to avoid duplicate tables.
#[derive(Debug, Default)]
pub struct CodebookCache {
    entries: DashMap<(u8, Device), Arc<CodebookTables>>,
}

impl CodebookCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tables for `(bits, device)`, materializing them on first use.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if `bits` is unsupported.
    pub fn tables(&self, bits: u8, device: Device) -> Result<Arc<CodebookTables>> {
        let key = (bits, device);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let codebook = Codebook::generate(bits)?;
        let fresh = Arc::new(CodebookTables::materialize(&codebook, device));
        let entry = self.entries.entry(key).or_insert_with(|| {
            tracing::debug!(
                bits,
                device = %device,
                centroids = fresh.centroids().len(),
                "materialized codebook tables"
            );
            Arc::clone(&fresh)
        });
        Ok(Arc::clone(entry.value()))
    }

    /// Centroid table for `(bits, device)`.
    pub fn centroids_for(&self, bits: u8, device: Device) -> Result<Arc<[f32]>> {
        self.tables(bits, device).map(|t| Arc::clone(&t.centroids))
    }

    /// Boundary table for `(bits, device)`.
    pub fn boundaries_for(&self, bits: u8, device: Device) -> Result<Arc<[f32]>> {
        self.tables(bits, device).map(|t| Arc::clone(&t.boundaries))
    }

    /// Number of materialized entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been materialized yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Compile-time check: the cache is shared across threads.
#[allow(dead_code)]
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CodebookCache>();
};
