//! External system integrations for Folio.
//!
//! This module provides adapters for integrating with external systems:
//!
//! - [`database`] - Database sink abstraction layer (trait-based)
//! - [`postgresql`] - PostgreSQL implementation
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind the
//! [`DatabaseSink`](database::DatabaseSink) trait so the transform pipeline
//! can be tested with in-memory implementations.
//!
//! # PostgreSQL Adapter
//!
//! ```rust,no_run
//! use folio::adapters::postgresql::{PostgreSQLClient, PostgreSQLSink};
//! use folio::config::{secret_string, PostgreSQLConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PostgreSQLConfig {
//!     connection_string: secret_string("postgresql://folio:pw@localhost/folio".to_string()),
//!     max_connections: 10,
//!     connection_timeout_seconds: 30,
//!     statement_timeout_seconds: 600,
//! };
//!
//! let client = PostgreSQLClient::new(config)?;
//! client.test_connection().await?;
//! let sink = PostgreSQLSink::new(client);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod postgresql;
