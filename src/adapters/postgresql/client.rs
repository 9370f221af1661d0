//! PostgreSQL client implementation
//!
//! This module provides the pooled client used by the PostgreSQL sink.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{FolioError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::NoTls;

/// PostgreSQL client for Folio
///
/// Wraps a connection pool. Every statement runs with the configured
/// statement timeout.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Database name from the connection string
    database_name: String,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened until the first statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool
    /// cannot be built.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config =
            config.connection_string.expose_secret().parse().map_err(|e| {
                FolioError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
            })?;

        let database_name = pg_config.get_dbname().unwrap_or("postgres").to_string();

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .build()
            .map_err(|e| {
                FolioError::Database(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self {
            pool,
            database_name,
            config,
        })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| FolioError::Database(format!("Connection test failed: {}", e)))?;

        tracing::info!(
            database = %self.database_name,
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Create the `companies` and `meta` tables if they don't exist
    pub async fn ensure_schema(&self) -> Result<()> {
        let migration_sql = include_str!("../../../migrations/001_initial_schema.sql");
        self.batch_execute(migration_sql)
            .await
            .map_err(|e| e.context("Failed to apply schema"))?;

        tracing::debug!("PostgreSQL schema initialized");
        Ok(())
    }

    /// Get a connection from the pool with the statement timeout applied
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        let client = self.pool.get().await.map_err(|e| {
            FolioError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .batch_execute(&timeout_query)
            .await
            .map_err(|e| FolioError::Database(format!("Failed to set statement timeout: {}", e)))?;

        Ok(client)
    }

    /// Execute a statement and return the number of affected rows
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn execute(
        &self,
        statement: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<u64> {
        let client = self.get_connection().await?;

        client
            .execute(statement, params)
            .await
            .map_err(|e| FolioError::Database(format!("Statement execution failed: {}", e)))
    }

    /// Execute one or more statements without parameters
    pub async fn batch_execute(&self, sql: &str) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(sql)
            .await
            .map_err(|e| FolioError::Database(format!("Statement execution failed: {}", e)))
    }

    /// Database name from the connection string
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Get the connection string (without password)
    pub fn connection_string_safe(&self) -> String {
        self.config.connection_string_safe()
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}
