//! PostgreSQL adapter implementing the database sink
//!
//! Company records are stored as JSONB in `companies`, run metadata in
//! `meta`. During a load the table is unlogged and its GIN index dropped;
//! both are restored in `post_load`.

use crate::adapters::database::traits::{CompanyRow, DatabaseSink};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::domain::Result;
use async_trait::async_trait;
use std::sync::Arc;

const INSERT_COMPANIES: &str = r#"
    INSERT INTO companies (id, json)
    SELECT id, body::jsonb FROM UNNEST($1::text[], $2::text[]) AS batch (id, body)
    ON CONFLICT (id) DO UPDATE SET json = EXCLUDED.json
"#;

const UPSERT_META: &str = r#"
    INSERT INTO meta (key, value) VALUES ($1, $2)
    ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
"#;

const PRE_LOAD: &str = r#"
    ALTER TABLE companies SET UNLOGGED;
    DROP INDEX IF EXISTS companies_json_idx;
"#;

const POST_LOAD: &str = r#"
    CREATE INDEX IF NOT EXISTS companies_json_idx ON companies USING GIN (json jsonb_path_ops);
    ALTER TABLE companies SET LOGGED;
    ANALYZE companies;
"#;

/// PostgreSQL implementation of [`DatabaseSink`]
pub struct PostgreSQLSink {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLSink {
    /// Create a new PostgreSQL sink
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

/// Split a batch into the parallel id and body arrays bound to `UNNEST`
fn columns(batch: Vec<CompanyRow>) -> (Vec<String>, Vec<String>) {
    batch.into_iter().map(|row| (row.id, row.json)).unzip()
}

#[async_trait]
impl DatabaseSink for PostgreSQLSink {
    async fn pre_load(&self) -> Result<()> {
        self.client.ensure_schema().await?;
        self.client
            .batch_execute(PRE_LOAD)
            .await
            .map_err(|e| e.context("pre-load"))?;
        tracing::info!(database = %self.client.database_name(), "Prepared companies table for bulk load");
        Ok(())
    }

    async fn create_companies(&self, batch: Vec<CompanyRow>) -> Result<()> {
        let (ids, bodies) = columns(batch);
        let written = self
            .client
            .execute(INSERT_COMPANIES, &[&ids, &bodies])
            .await
            .map_err(|e| e.context(format!("inserting {} companies", ids.len())))?;
        tracing::trace!(rows = written, "Inserted company batch");
        Ok(())
    }

    async fn post_load(&self) -> Result<()> {
        self.client
            .batch_execute(POST_LOAD)
            .await
            .map_err(|e| e.context("post-load"))?;
        tracing::info!(database = %self.client.database_name(), "Restored companies index and logging");
        Ok(())
    }

    async fn meta_save(&self, key: &str, value: &str) -> Result<()> {
        self.client
            .execute(UPSERT_META, &[&key, &value])
            .await
            .map_err(|e| e.context(format!("saving metadata '{key}'")))?;
        Ok(())
    }

    fn database_name(&self) -> &str {
        self.client.database_name()
    }
}
