//! Transform coordinator - main orchestrator for a transform run
//!
//! Resolves the execution mode, owns the staging directory for the length of
//! the run and sequences the phases:
//!
//! | mode | staging directory | phases |
//! |---|---|---|
//! | step one | fresh temporary, kept on success | load |
//! | step two | caller's, never removed | write, metadata |
//! | both | fresh temporary, always removed | load, write, metadata |

use crate::adapters::database::DatabaseSink;
use crate::config::FolioConfig;
use crate::core::lookups::Lookups;
use crate::core::pipeline::batch::{BatchConfig, JsonRecordsTask};
use crate::core::pipeline::metadata::save_updated_at;
use crate::core::pipeline::mode::TransformMode;
use crate::core::pipeline::summary::{TransformOutcome, TransformSummary};
use crate::core::staging::{LoadSummary, StagingDir, StagingStore};
use crate::domain::{FolioError, Result};
use crate::{log_phase_complete, log_phase_start};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Inputs of a transform run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Extract directory: source files, lookups and `updated_at.txt`
    pub directory: PathBuf,

    pub max_parallel_db_queries: usize,

    pub batch_size: usize,

    pub privacy: bool,

    /// Only build the staging store
    pub step_one: bool,

    /// Staging directory to write from; empty for none
    pub step_two: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            max_parallel_db_queries: crate::config::schema::default_max_parallel_db_queries(),
            batch_size: crate::config::schema::default_batch_size(),
            privacy: false,
            step_one: false,
            step_two: String::new(),
        }
    }
}

impl TransformOptions {
    /// Options taken from the `[source]` and `[transform]` sections
    pub fn from_config(config: &FolioConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.source.directory),
            max_parallel_db_queries: config.transform.max_parallel_db_queries,
            batch_size: config.transform.batch_size,
            privacy: config.transform.privacy,
            ..Self::default()
        }
    }
}

/// Transform coordinator
///
/// Generic over the staging store so the pipeline can run against any
/// [`StagingStore`] implementation.
pub struct TransformCoordinator<S: StagingStore> {
    options: TransformOptions,
    database: Option<Arc<dyn DatabaseSink>>,
    staging_parent: Option<PathBuf>,
    _store: PhantomData<fn() -> S>,
}

impl<S: StagingStore> TransformCoordinator<S> {
    /// Create a coordinator; `database` may be `None` for step-one runs
    pub fn new(options: TransformOptions, database: Option<Arc<dyn DatabaseSink>>) -> Self {
        Self {
            options,
            database,
            staging_parent: None,
            _store: PhantomData,
        }
    }

    /// Create temporary staging directories under `parent` instead of the
    /// system temp dir
    pub fn with_staging_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.staging_parent = Some(parent.into());
        self
    }

    /// Execute the transform
    ///
    /// Mode and options are checked before any directory is created or any
    /// store opened. A temporary staging directory is removed on every exit
    /// path except a successful step-one run, which keeps and reports it.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::Configuration`] for an invalid mode, a zero
    /// bound or a missing database; otherwise the first error of the failing
    /// phase, with phase context.
    pub async fn execute(&self) -> Result<TransformOutcome> {
        let start = Instant::now();
        let options = &self.options;

        let mode = TransformMode::resolve(options.step_one, &options.step_two)?;
        let batch = BatchConfig::new(
            options.batch_size,
            options.max_parallel_db_queries,
            options.privacy,
        )?;
        let sink = match (&mode, &self.database) {
            (TransformMode::StepOne, _) => None,
            (_, Some(database)) => Some(Arc::clone(database)),
            (_, None) => {
                return Err(FolioError::Configuration(format!(
                    "a database is required in {mode} mode"
                )))
            }
        };

        tracing::info!(
            mode = %mode,
            directory = %options.directory.display(),
            batch_size = batch.batch_size,
            max_parallel_db_queries = batch.max_parallel_db_queries,
            privacy = batch.privacy,
            "Starting transform"
        );

        let staging = match mode.staging_path() {
            Some(path) => StagingDir::existing(path),
            None => match &self.staging_parent {
                Some(parent) => StagingDir::temporary_in(parent)?,
                None => StagingDir::temporary()?,
            },
        };

        let lookups = Arc::new(load_lookups(&options.directory).await?);

        let load = if mode.runs_step_one() {
            Some(
                stage::<S>(&options.directory, staging.path(), Arc::clone(&lookups))
                    .await
                    .map_err(|e| e.context(format!("step one ({})", staging.path().display())))?,
            )
        } else {
            None
        };

        let Some(sink) = sink else {
            let path = staging.persist();
            tracing::info!(path = %path.display(), "Staging store kept for step two");
            return Ok(TransformOutcome::Staged {
                path,
                load: load.unwrap_or_default(),
            });
        };

        let staging_dir = staging.path().to_path_buf();
        let store = open_store::<S>(&staging_dir)
            .await
            .map_err(|e| e.context(format!("step two ({})", staging_dir.display())))?;
        let write = JsonRecordsTask::new(store, lookups, Arc::clone(&sink), batch)
            .run()
            .await
            .map_err(|e| e.context(format!("step two ({})", staging_dir.display())))?;

        let updated_at = save_updated_at(&options.directory, sink.as_ref()).await?;

        staging.cleanup();

        let summary = TransformSummary {
            mode,
            staging_dir,
            load,
            write,
            updated_at,
            duration: start.elapsed(),
        };
        summary.log_summary();
        Ok(TransformOutcome::Written(summary))
    }
}

async fn load_lookups(dir: &Path) -> Result<Lookups> {
    let dir = dir.to_path_buf();
    blocking(move || Lookups::from_dir(&dir))
        .await
        .map_err(|e| e.context("loading lookup tables"))
}

/// Phase 1: create the store in `staging`, load the extract and close it
async fn stage<S: StagingStore>(
    source: &Path,
    staging: &Path,
    lookups: Arc<Lookups>,
) -> Result<LoadSummary> {
    let source = source.to_path_buf();
    let staging = staging.to_path_buf();
    log_phase_start!("staging load", staging.display());
    let start = Instant::now();

    let summary = blocking(move || {
        let mut store = S::create(&staging)?;
        let summary = store.load(&source, &lookups)?;
        store.close()?;
        Ok(summary)
    })
    .await?;

    log_phase_complete!("staging load", summary.rows(), start.elapsed());
    Ok(summary)
}

async fn open_store<S: StagingStore>(staging: &Path) -> Result<S> {
    let staging = staging.to_path_buf();
    blocking(move || S::open(&staging)).await
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FolioError::Other(format!("blocking task failed: {e}")))?
}
