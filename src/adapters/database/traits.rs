//! Database abstraction traits
//!
//! This module defines the trait that database adapters must implement
//! to receive the records produced by Folio.

use crate::domain::Result;
use async_trait::async_trait;

/// One serialised company record, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRow {
    /// Company identifier, the primary key
    pub id: String,

    /// JSON document for the company
    pub json: String,
}

impl CompanyRow {
    pub fn new(id: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            json: json.into(),
        }
    }
}

/// Destination of the Phase 2 records and of the run metadata
///
/// The transform pipeline calls `pre_load` once, then `create_companies`
/// concurrently from up to `max_parallel_db_queries` tasks, then `post_load`
/// once, then `meta_save`. Writes are keyed upserts, so batch order does not
/// matter.
#[async_trait]
pub trait DatabaseSink: Send + Sync {
    /// Prepare the destination for a bulk load
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be prepared.
    async fn pre_load(&self) -> Result<()>;

    /// Write one batch of company records
    ///
    /// # Errors
    ///
    /// Returns an error if any record of the batch cannot be written.
    async fn create_companies(&self, batch: Vec<CompanyRow>) -> Result<()>;

    /// Restore the destination after the last batch
    ///
    /// # Errors
    ///
    /// Returns an error if indexes or constraints cannot be restored.
    async fn post_load(&self) -> Result<()>;

    /// Store a metadata key/value pair
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be saved.
    async fn meta_save(&self, key: &str, value: &str) -> Result<()>;

    /// Name of the destination, for logs
    fn database_name(&self) -> &str;
}
