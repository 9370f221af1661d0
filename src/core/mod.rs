//! Core business logic for Folio.
//!
//! This module contains the two-phase transform of a company registry extract
//! into JSON records.
//!
//! # Modules
//!
//! - [`source`] - Reading the `;`-separated source files, plain or zipped
//! - [`lookups`] - Code to description tables
//! - [`staging`] - The staging store between the two phases
//! - [`privacy`] - Personal data redaction
//! - [`pipeline`] - Mode resolution, orchestration and batch writes
//!
//! # Transform Workflow
//!
//! 1. **Resolve mode**: step one, step two or both
//! 2. **Load lookups**: read the six auxiliary tables once
//! 3. **Stage** (step one): stream every source file into the staging store,
//!    keyed by company identifier
//! 4. **Write** (step two): scan the keys in order, assemble each company,
//!    and write batches through the database sink with bounded parallelism
//! 5. **Metadata**: save the extract's `updated_at.txt`
//!
//! # Example
//!
//! ```rust,no_run
//! use folio::adapters::database::create_database_sink;
//! use folio::config::load_config;
//! use folio::core::pipeline::{TransformCoordinator, TransformOptions, TransformOutcome};
//! use folio::core::staging::SqliteStaging;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("folio.toml")?;
//! let sink = create_database_sink(&config).await?;
//!
//! let coordinator = TransformCoordinator::<SqliteStaging>::new(
//!     TransformOptions::from_config(&config),
//!     Some(sink),
//! );
//!
//! if let TransformOutcome::Written(summary) = coordinator.execute().await? {
//!     println!("Companies: {}", summary.write.companies);
//! }
//! # Ok(())
//! # }
//! ```

pub mod lookups;
pub mod pipeline;
pub mod privacy;
pub mod source;
pub mod staging;
