//! PostgreSQL database integration
//!
//! This module provides integration with PostgreSQL for storing company
//! records and run metadata.

pub mod adapter;
pub mod client;

pub use adapter::PostgreSQLSink;
pub use client::PostgreSQLClient;
