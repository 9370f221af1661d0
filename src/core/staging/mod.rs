//! Staging store: the durable intermediate between the two phases
//!
//! Phase 1 streams the extract into a [`StagingStore`] keyed by company
//! identifier; Phase 2 scans the keys in ascending order and reassembles each
//! company. The store lives in a directory managed by [`StagingDir`], so a
//! step-one run on one machine can feed a step-two run on another.
//!
//! All methods are blocking. Async callers run them inside
//! `tokio::task::spawn_blocking`.

pub mod dir;
pub mod sqlite;

pub use dir::StagingDir;
pub use sqlite::SqliteStaging;

use crate::core::lookups::Lookups;
use crate::core::source::SourceKind;
use crate::domain::{Company, CompanyId, Result};
use serde::Serialize;
use std::path::Path;

/// Persistent key-value store of partially assembled company records
pub trait StagingStore: Sized + Send + 'static {
    /// Create a new, empty store inside `path`
    fn create(path: &Path) -> Result<Self>;

    /// Open the store previously created inside `path`
    fn open(path: &Path) -> Result<Self>;

    /// Load every staged file kind from the extract directory `dir`
    fn load(&mut self, dir: &Path, lookups: &Lookups) -> Result<LoadSummary>;

    /// Up to `limit` identifiers strictly greater than `after`, ascending
    fn next_ids(&self, after: Option<&CompanyId>, limit: usize) -> Result<Vec<CompanyId>>;

    /// Fill `company` with everything staged under its identifier
    fn enrich_company(&self, company: &mut Company) -> Result<()>;

    /// Flush and release the store
    ///
    /// Dropping the store also releases it, without reporting errors.
    fn close(self) -> Result<()>;
}

/// Counters reported by Phase 1
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadSummary {
    /// Source files read
    pub files: usize,

    /// Base company rows
    pub companies: u64,

    /// Establishment rows
    pub establishments: u64,

    /// Partner rows
    pub partners: u64,

    /// Tax regime rows
    pub tax_regimes: u64,

    /// Distinct company identifiers in the store
    pub keys: u64,

    /// Duration in seconds
    pub duration_seconds: f64,
}

impl LoadSummary {
    /// Count `rows` read from one file of `kind`
    pub fn add_file(&mut self, kind: SourceKind, rows: u64) {
        self.files += 1;
        match kind {
            SourceKind::Companies => self.companies += rows,
            SourceKind::Establishments => self.establishments += rows,
            SourceKind::Partners => self.partners += rows,
            SourceKind::TaxRegimes => self.tax_regimes += rows,
            _ => {}
        }
    }

    /// Total rows read
    pub fn rows(&self) -> u64 {
        self.companies + self.establishments + self.partners + self.tax_regimes
    }
}
