//! Persistence of the extract's update timestamp

use crate::adapters::database::DatabaseSink;
use crate::domain::{FolioError, Result};
use std::path::Path;

/// File in the extract directory holding the extract's update timestamp
pub const UPDATED_AT_FILE: &str = "updated_at.txt";

/// Metadata key the timestamp is saved under
pub const UPDATED_AT_KEY: &str = "updated-at";

/// Read `<dir>/updated_at.txt` and save its content verbatim under
/// `updated-at`, returning the saved value
///
/// # Errors
///
/// Returns [`FolioError::Input`] if the file cannot be read, or the sink's
/// error if the value cannot be saved.
pub async fn save_updated_at(dir: &Path, sink: &dyn DatabaseSink) -> Result<String> {
    let path = dir.join(UPDATED_AT_FILE);
    let value = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| FolioError::Input(format!("cannot read {}: {e}", path.display())))?;

    sink.meta_save(UPDATED_AT_KEY, &value)
        .await
        .map_err(|e| e.context(format!("saving {UPDATED_AT_KEY}")))?;

    tracing::info!(key = UPDATED_AT_KEY, value = %value.trim(), "Saved metadata");
    Ok(value)
}
