//! Transform command implementation
//!
//! This module implements the `transform` command, which runs step one, step
//! two or both phases of the transform.

use crate::adapters::database::create_database_sink;
use crate::config::{load_config, FolioConfig};
use crate::core::pipeline::{TransformCoordinator, TransformMode, TransformOptions, TransformOutcome};
use crate::core::staging::SqliteStaging;
use crate::domain::FolioError;
use clap::Args;

/// Arguments for the transform command
#[derive(Args, Debug, Default)]
pub struct TransformArgs {
    /// Extract directory (overrides source.directory)
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Maximum simultaneous batch writes (overrides transform.max_parallel_db_queries)
    #[arg(long, value_name = "N")]
    pub max_parallel_db_queries: Option<usize>,

    /// Records per batch write (overrides transform.batch_size)
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Redact personal data from the records
    #[arg(long)]
    pub privacy: bool,

    /// Only build the staging store and print its path
    #[arg(long)]
    pub step_one: bool,

    /// Write records from the staging store at PATH
    #[arg(long, value_name = "PATH")]
    pub step_two: Option<String>,
}

impl TransformArgs {
    /// Apply CLI overrides to the loaded configuration
    pub fn apply_overrides(&self, config: &mut FolioConfig) {
        if let Some(directory) = &self.directory {
            tracing::info!(directory = %directory, "Overriding source directory from CLI");
            config.source.directory = directory.clone();
        }
        if let Some(n) = self.max_parallel_db_queries {
            tracing::info!(max_parallel_db_queries = n, "Overriding parallelism from CLI");
            config.transform.max_parallel_db_queries = n;
        }
        if let Some(n) = self.batch_size {
            tracing::info!(batch_size = n, "Overriding batch size from CLI");
            config.transform.batch_size = n;
        }
        if self.privacy {
            tracing::info!("Enabling privacy mode from CLI");
            config.transform.privacy = true;
        }
    }

    /// Options for the coordinator, after overrides
    pub fn options(&self, config: &FolioConfig) -> TransformOptions {
        TransformOptions {
            step_one: self.step_one,
            step_two: self.step_two.clone().unwrap_or_default(),
            ..TransformOptions::from_config(config)
        }
    }

    /// Execute the transform command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting transform command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };
        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let options = self.options(&config);
        let mode = match TransformMode::resolve(options.step_one, &options.step_two) {
            Ok(mode) => mode,
            Err(e) => {
                eprintln!("Invalid mode: {e}");
                return Ok(2);
            }
        };

        let sink = if mode.needs_database() {
            match create_database_sink(&config).await {
                Ok(sink) => Some(sink),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to database");
                    eprintln!("Failed to connect to database: {e}");
                    return Ok(match e {
                        FolioError::Configuration(_) => 2,
                        _ => 4,
                    });
                }
            }
        } else {
            None
        };

        println!("🚀 Starting transform ({mode})...");
        println!();

        let coordinator = TransformCoordinator::<SqliteStaging>::new(options, sink);
        let outcome = match coordinator.execute().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Transform failed");
                eprintln!("Transform failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        match outcome {
            TransformOutcome::Staged { path, load } => {
                println!("📦 Staging Summary:");
                println!("  Files: {}", load.files);
                println!("  Rows: {}", load.rows());
                println!("  Companies: {}", load.keys);
                println!("  Duration: {:.2}s", load.duration_seconds);
                println!();
                println!("✅ Step one completed. Run step two with:");
                println!("   folio transform --step-two {}", path.display());
                println!();
                // Last line of stdout is the bare path, for scripts.
                println!("{}", path.display());
            }
            TransformOutcome::Written(summary) => {
                println!("📊 Transform Summary:");
                if let Some(load) = &summary.load {
                    println!("  Staged Rows: {}", load.rows());
                }
                println!("  Companies Written: {}", summary.write.companies);
                println!("  Batches: {}", summary.write.batches);
                if summary.write.redacted_fields > 0 {
                    println!("  Redacted Fields: {}", summary.write.redacted_fields);
                }
                println!("  Updated At: {}", summary.updated_at.trim());
                println!("  Throughput: {:.0} records/s", summary.write.throughput());
                println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
                println!();
                println!("✅ Transform completed successfully!");
            }
        }

        Ok(0)
    }
}

/// Process exit code for a failed run
pub fn exit_code(error: &FolioError) -> i32 {
    match error {
        FolioError::Configuration(_) => 2,
        _ => 5,
    }
}
