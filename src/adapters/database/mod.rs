//! Database abstraction layer
//!
//! This module provides a trait-based abstraction for the destination of the
//! transform, so the pipeline can be driven against PostgreSQL or an
//! in-memory fake in tests.

pub mod factory;
pub mod traits;

pub use factory::create_database_sink;
pub use traits::{CompanyRow, DatabaseSink};
