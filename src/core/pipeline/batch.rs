//! Phase 2: batch build and bounded parallel write
//!
//! A blocking producer walks the staging keys in ascending order, assembles
//! each company and sends full batches over a bounded channel. The async
//! dispatcher hands each batch to [`DatabaseSink::create_companies`] on a
//! [`JoinSet`], holding a semaphore permit until the write finishes, so at
//! most `max_parallel_db_queries` writes are in flight.
//!
//! The first failure, from either side, stops the run: nothing new is
//! dispatched, the producer stops scanning, in-flight writes drain and that
//! first error is returned. `post_load` only runs after every batch was
//! acknowledged.

use crate::adapters::database::{CompanyRow, DatabaseSink};
use crate::core::lookups::Lookups;
use crate::core::pipeline::record::build_record;
use crate::core::pipeline::summary::WriteSummary;
use crate::core::privacy::Redactor;
use crate::core::staging::StagingStore;
use crate::domain::{CompanyId, FolioError, Result};
use crate::{log_batch_written, log_phase_complete, log_phase_start};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};

/// Configuration for batch processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Records per `create_companies` call
    pub batch_size: usize,

    /// Maximum simultaneous `create_companies` calls
    pub max_parallel_db_queries: usize,

    /// Redact personal data before serialising
    pub privacy: bool,
}

impl BatchConfig {
    /// Create a validated batch configuration
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::Configuration`] if either bound is zero.
    pub fn new(batch_size: usize, max_parallel_db_queries: usize, privacy: bool) -> Result<Self> {
        if batch_size == 0 {
            return Err(FolioError::Configuration(
                "batch size must be greater than 0".to_string(),
            ));
        }
        if max_parallel_db_queries == 0 {
            return Err(FolioError::Configuration(
                "max parallel database queries must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            batch_size,
            max_parallel_db_queries,
            privacy,
        })
    }
}

/// One batch of serialised records, numbered from 1 in scan order
#[derive(Debug)]
struct RecordBatch {
    index: u64,
    rows: Vec<CompanyRow>,
}

/// First error of the run, shared by the producer and the writers
#[derive(Debug, Default)]
struct Failure {
    flag: AtomicBool,
    first: Mutex<Option<FolioError>>,
}

impl Failure {
    fn record(&self, error: FolioError) {
        let mut first = self.first.lock().unwrap_or_else(PoisonError::into_inner);
        if first.is_none() {
            tracing::error!(error = %error, "Stopping transform after failure");
            *first = Some(error);
        } else {
            tracing::debug!(error = %error, "Ignoring error after first failure");
        }
        self.flag.store(true, Ordering::SeqCst);
    }

    fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn take(&self) -> Option<FolioError> {
        self.first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Builds JSON company records from a staging store and writes them through
/// a [`DatabaseSink`]
pub struct JsonRecordsTask<S: StagingStore> {
    store: S,
    lookups: Arc<Lookups>,
    sink: Arc<dyn DatabaseSink>,
    config: BatchConfig,
}

impl<S: StagingStore> JsonRecordsTask<S> {
    pub fn new(
        store: S,
        lookups: Arc<Lookups>,
        sink: Arc<dyn DatabaseSink>,
        config: BatchConfig,
    ) -> Self {
        Self {
            store,
            lookups,
            sink,
            config,
        }
    }

    /// Run Phase 2 to completion
    ///
    /// The store is closed before this returns, on success or failure.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by `pre_load`, record assembly, a
    /// `create_companies` call or `post_load`.
    pub async fn run(self) -> Result<WriteSummary> {
        let Self {
            store,
            lookups,
            sink,
            config,
        } = self;
        let start = Instant::now();

        log_phase_start!("batch write", sink.database_name());
        sink.pre_load()
            .await
            .map_err(|e| e.context("preparing database for load"))?;

        let failure = Arc::new(Failure::default());
        let (tx, mut rx) = mpsc::channel::<RecordBatch>(config.max_parallel_db_queries);

        let producer = {
            let failure = Arc::clone(&failure);
            let redactor = Redactor::new(config.privacy);
            let batch_size = config.batch_size;
            tokio::task::spawn_blocking(move || {
                produce(store, &lookups, redactor, batch_size, tx, &failure)
            })
        };

        let semaphore = Arc::new(Semaphore::new(config.max_parallel_db_queries));
        let mut writes: JoinSet<Option<usize>> = JoinSet::new();
        let mut summary = WriteSummary::default();

        while let Some(batch) = rx.recv().await {
            while let Some(joined) = writes.try_join_next() {
                reap(joined, &mut summary, &failure);
            }
            if failure.is_set() {
                break;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    failure.record(FolioError::Other(format!("write limiter closed: {e}")));
                    break;
                }
            };
            // A write may have failed while we waited for the permit.
            if failure.is_set() {
                break;
            }

            let sink = Arc::clone(&sink);
            let failure = Arc::clone(&failure);
            writes.spawn(async move {
                let _permit = permit;
                let RecordBatch { index, rows } = batch;
                let count = rows.len();
                match sink.create_companies(rows).await {
                    Ok(()) => {
                        log_batch_written!(index, count);
                        Some(count)
                    }
                    Err(e) => {
                        failure.record(e.context(format!("writing batch {index}")));
                        None
                    }
                }
            });
        }

        drop(rx);
        while let Some(joined) = writes.join_next().await {
            reap(joined, &mut summary, &failure);
        }

        match producer.await {
            Ok(redacted) => summary.redacted_fields = redacted,
            Err(e) => failure.record(FolioError::Other(format!("record producer failed: {e}"))),
        }

        if let Some(error) = failure.take() {
            return Err(error);
        }

        sink.post_load()
            .await
            .map_err(|e| e.context("restoring database after load"))?;

        summary.duration = start.elapsed();
        log_phase_complete!("batch write", summary.companies, summary.duration);
        Ok(summary)
    }
}

fn reap(
    joined: std::result::Result<Option<usize>, JoinError>,
    summary: &mut WriteSummary,
    failure: &Failure,
) {
    match joined {
        Ok(Some(count)) => {
            summary.companies += count as u64;
            summary.batches += 1;
        }
        Ok(None) => {}
        Err(e) => failure.record(FolioError::Other(format!("batch writer failed: {e}"))),
    }
}

/// Scan the store and send batches until the keys run out, the channel
/// closes or a failure is recorded. Returns the number of redacted fields.
fn produce<S: StagingStore>(
    store: S,
    lookups: &Lookups,
    redactor: Redactor,
    batch_size: usize,
    tx: mpsc::Sender<RecordBatch>,
    failure: &Failure,
) -> u64 {
    let mut after: Option<CompanyId> = None;
    let mut index = 0;
    let mut redacted = 0u64;

    'scan: while !failure.is_set() {
        let ids = match store.next_ids(after.as_ref(), batch_size) {
            Ok(ids) => ids,
            Err(e) => {
                failure.record(e.context("scanning staging keys"));
                break;
            }
        };
        let Some(last) = ids.last().cloned() else {
            break;
        };
        let full = ids.len() == batch_size;

        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            if failure.is_set() {
                break 'scan;
            }
            let label = id.to_string();
            match build_record(&store, id, lookups, &redactor) {
                Ok(built) => {
                    redacted += built.redacted as u64;
                    rows.push(built.row);
                }
                Err(e) => {
                    failure.record(e.context(format!("building record {label}")));
                    break 'scan;
                }
            }
        }

        index += 1;
        if tx.blocking_send(RecordBatch { index, rows }).is_err() {
            tracing::debug!(batch = index, "Dispatcher stopped, ending scan");
            break;
        }
        if !full {
            break;
        }
        after = Some(last);
    }

    drop(tx);
    if let Err(e) = store.close() {
        failure.record(e.context("closing staging store"));
    }
    redacted
}
