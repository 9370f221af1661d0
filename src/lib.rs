// Folio - Company Registry Extract to PostgreSQL Transform Tool
// Copyright (c) 2025 Folio Contributors
// Licensed under the MIT License

//! # Folio - Company Registry Extract to PostgreSQL
//!
//! Folio turns the public company registry extract (companies,
//! establishments, partners, simplified tax regime and their lookup tables)
//! into one self-contained JSON record per company, stored in PostgreSQL.
//!
//! ## Overview
//!
//! The transform runs in two phases:
//! - **Step one** streams every source file into a local staging store keyed
//!   by company identifier
//! - **Step two** scans the store in key order, assembles each company and
//!   writes batches of records with bounded parallelism
//!
//! The phases can run together, or separately on different machines: step
//! one reports the staging directory, step two takes it as input.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Source reading, lookups, staging, privacy and the pipeline
//! - [`adapters`] - Database sink trait and its PostgreSQL implementation
//! - [`domain`] - Company model, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use folio::adapters::database::create_database_sink;
//! use folio::config::FolioConfig;
//! use folio::core::pipeline::{TransformCoordinator, TransformOptions};
//! use folio::core::staging::SqliteStaging;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FolioConfig::from_file("folio.toml")?;
//!     let sink = create_database_sink(&config).await?;
//!
//!     let coordinator = TransformCoordinator::<SqliteStaging>::new(
//!         TransformOptions::from_config(&config),
//!         Some(sink),
//!     );
//!     coordinator.execute().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error is
//! [`domain::FolioError`]. The first fatal error of a run stops it; there are
//! no retries.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
