//! Transform orchestration and batch processing
//!
//! This module provides the two-phase transform, including:
//! - Execution mode resolution
//! - Staging load and parallel batch writes
//! - Metadata persistence and run summaries

pub mod batch;
pub mod coordinator;
pub mod metadata;
pub mod mode;
pub mod record;
pub mod summary;

pub use batch::{BatchConfig, JsonRecordsTask};
pub use coordinator::{TransformCoordinator, TransformOptions};
pub use metadata::{save_updated_at, UPDATED_AT_FILE, UPDATED_AT_KEY};
pub use mode::TransformMode;
pub use record::{apply_record_lookups, build_record, finish_record, BuiltRecord};
pub use summary::{TransformOutcome, TransformSummary, WriteSummary};
