//! Database sink factory
//!
//! This module provides the factory function that builds the database sink
//! from configuration and checks that the database is reachable.

use crate::adapters::database::traits::DatabaseSink;
use crate::adapters::postgresql::adapter::PostgreSQLSink;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::FolioConfig;
use crate::domain::{FolioError, Result};
use std::sync::Arc;

/// Create the database sink described by the configuration
///
/// # Errors
///
/// Returns [`FolioError::Configuration`] if the `[postgresql]` section is
/// missing or the connection string is invalid, and
/// [`FolioError::Database`] if the database cannot be reached.
pub async fn create_database_sink(config: &FolioConfig) -> Result<Arc<dyn DatabaseSink>> {
    let pg_config = config.postgresql.as_ref().ok_or_else(|| {
        FolioError::Configuration(
            "postgresql configuration is required to write company records".to_string(),
        )
    })?;

    let client = PostgreSQLClient::new(pg_config.clone())?;
    client.test_connection().await?;

    tracing::info!(
        connection = %client.connection_string_safe(),
        max_connections = pg_config.max_connections,
        "Created PostgreSQL sink"
    );

    Ok(Arc::new(PostgreSQLSink::new(client)))
}
