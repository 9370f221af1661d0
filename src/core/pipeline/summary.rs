//! Transform summary and reporting

use crate::core::pipeline::mode::TransformMode;
use crate::core::staging::LoadSummary;
use std::path::PathBuf;
use std::time::Duration;

/// Counters reported by Phase 2
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSummary {
    /// Company records acknowledged by the sink
    pub companies: u64,

    /// Batches acknowledged by the sink
    pub batches: u64,

    /// Personal fields removed by privacy mode
    pub redacted_fields: u64,

    pub duration: Duration,
}

impl WriteSummary {
    /// Records per second, zero for an instant run
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.companies as f64 / secs
        }
    }
}

/// Summary of a run that wrote to the database
#[derive(Debug, Clone)]
pub struct TransformSummary {
    pub mode: TransformMode,

    /// Directory that held the staging store
    ///
    /// Already removed when the mode is [`TransformMode::Both`].
    pub staging_dir: PathBuf,

    /// Phase 1 counters, absent in step-two mode
    pub load: Option<LoadSummary>,

    pub write: WriteSummary,

    /// Value saved under the `updated-at` metadata key
    pub updated_at: String,

    /// Duration of the whole run
    pub duration: Duration,
}

impl TransformSummary {
    /// Log summary information
    pub fn log_summary(&self) {
        tracing::info!(
            mode = %self.mode,
            staging_dir = %self.staging_dir.display(),
            staged_rows = self.load.as_ref().map(LoadSummary::rows).unwrap_or(0),
            companies = self.write.companies,
            batches = self.write.batches,
            redacted_fields = self.write.redacted_fields,
            updated_at = %self.updated_at.trim(),
            duration_seconds = self.duration.as_secs_f64(),
            "Transform completed"
        );
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub enum TransformOutcome {
    /// Step one: the staging store was kept at `path`
    Staged { path: PathBuf, load: LoadSummary },

    /// Step two or both: records were written
    Written(TransformSummary),
}

impl TransformOutcome {
    /// Path of the retained staging store, for step-one runs
    pub fn staged_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Staged { path, .. } => Some(path),
            Self::Written(_) => None,
        }
    }
}
