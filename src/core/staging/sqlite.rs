//! SQLite-backed staging store
//!
//! One `staging.db` file per staging directory. The `companies` table is the
//! key set; the other tables hold the JSON-encoded pieces of each record.
//! Base company and tax regime rows are merged on write, establishments and
//! partners keep their insertion order through the implicit rowid.

use super::{LoadSummary, StagingStore};
use crate::core::lookups::Lookups;
use crate::core::source::{self, rows, SourceKind};
use crate::domain::{
    BaseCompany, Company, CompanyId, Establishment, FolioError, Partner, Result, TaxRegime,
};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File name of the store inside the staging directory
pub const STAGING_FILE: &str = "staging.db";

/// Schema version written at creation and checked on open
pub const SCHEMA_VERSION: i64 = 1;

/// Rows written per transaction during Phase 1
const COMMIT_EVERY: u64 = 50_000;

const SCHEMA: &str = "
    CREATE TABLE staging_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    ) WITHOUT ROWID;
    CREATE TABLE companies (
        id TEXT PRIMARY KEY
    ) WITHOUT ROWID;
    CREATE TABLE base (
        id TEXT PRIMARY KEY,
        body TEXT NOT NULL
    ) WITHOUT ROWID;
    CREATE TABLE tax_regimes (
        id TEXT PRIMARY KEY,
        body TEXT NOT NULL
    ) WITHOUT ROWID;
    CREATE TABLE establishments (
        id TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX establishments_id ON establishments (id);
    CREATE TABLE partners (
        id TEXT NOT NULL,
        body TEXT NOT NULL
    );
    CREATE INDEX partners_id ON partners (id);
";

/// [`StagingStore`] backed by a single SQLite database file
#[derive(Debug)]
pub struct SqliteStaging {
    connection: Connection,
    path: PathBuf,
}

impl SqliteStaging {
    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn configure(connection: &Connection) -> Result<()> {
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    fn check_version(&self) -> Result<()> {
        let version: Option<String> = self
            .connection
            .query_row(
                "SELECT value FROM staging_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| {
                FolioError::Storage(format!("{} is not a staging store: {e}", self.path.display()))
            })?;

        match version {
            Some(v) if v == SCHEMA_VERSION.to_string() => Ok(()),
            Some(v) => Err(FolioError::Storage(format!(
                "{} has schema version {v}, expected {SCHEMA_VERSION}",
                self.path.display()
            ))),
            None => Err(FolioError::Storage(format!(
                "{} has no schema version",
                self.path.display()
            ))),
        }
    }

    fn load_file(&self, path: &Path, kind: SourceKind, lookups: &Lookups) -> Result<u64> {
        let conn = &self.connection;
        conn.execute_batch("BEGIN")?;

        let mut pending = 0u64;
        let result = source::for_each_record(path, kind, |row| {
            match kind {
                SourceKind::Companies => {
                    let (id, base) = rows::parse_company(row)?;
                    insert_key(conn, &id)?;
                    merge_into::<BaseCompany>(conn, "base", &id, base, BaseCompany::merge)?;
                }
                SourceKind::Establishments => {
                    let (id, establishment) = rows::parse_establishment(row, lookups)?;
                    insert_key(conn, &id)?;
                    append(conn, "establishments", &id, &establishment)?;
                }
                SourceKind::Partners => {
                    let (id, partner) = rows::parse_partner(row, lookups)?;
                    append(conn, "partners", &id, &partner)?;
                }
                SourceKind::TaxRegimes => {
                    let (id, regime) = rows::parse_tax_regime(row)?;
                    merge_into::<TaxRegime>(conn, "tax_regimes", &id, regime, TaxRegime::merge)?;
                }
                other => {
                    return Err(FolioError::Other(format!("{other} files are not staged")));
                }
            }

            pending += 1;
            if pending == COMMIT_EVERY {
                conn.execute_batch("COMMIT; BEGIN")?;
                pending = 0;
            }
            Ok(())
        });

        match result {
            Ok(count) => {
                conn.execute_batch("COMMIT")?;
                Ok(count)
            }
            Err(e) => {
                if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                    tracing::warn!(error = %rollback, "Failed to roll back staging transaction");
                }
                Err(e)
            }
        }
    }

    fn count_keys(&self) -> Result<u64> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn bodies<T: DeserializeOwned>(&self, table: &str, id: &CompanyId) -> Result<Vec<T>> {
        let mut statement = self
            .connection
            .prepare_cached(&format!("SELECT body FROM {table} WHERE id = ?1 ORDER BY rowid"))?;
        let rows = statement.query_map([id.as_str()], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for body in rows {
            items.push(serde_json::from_str(&body?)?);
        }
        Ok(items)
    }
}

fn insert_key(conn: &Connection, id: &CompanyId) -> Result<()> {
    conn.prepare_cached("INSERT OR IGNORE INTO companies (id) VALUES (?1)")?
        .execute([id.as_str()])?;
    Ok(())
}

fn append<T: Serialize>(conn: &Connection, table: &str, id: &CompanyId, value: &T) -> Result<()> {
    let body = serde_json::to_string(value)?;
    conn.prepare_cached(&format!("INSERT INTO {table} (id, body) VALUES (?1, ?2)"))?
        .execute([id.as_str(), body.as_str()])?;
    Ok(())
}

fn read_one<T: DeserializeOwned>(conn: &Connection, table: &str, id: &CompanyId) -> Result<Option<T>> {
    let body: Option<String> = conn
        .prepare_cached(&format!("SELECT body FROM {table} WHERE id = ?1"))?
        .query_row([id.as_str()], |row| row.get(0))
        .optional()?;
    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

fn merge_into<T>(
    conn: &Connection,
    table: &str,
    id: &CompanyId,
    incoming: T,
    merge: fn(&mut T, T),
) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let merged = match read_one::<T>(conn, table, id)? {
        Some(mut current) => {
            merge(&mut current, incoming);
            current
        }
        None => incoming,
    };
    let body = serde_json::to_string(&merged)?;
    conn.prepare_cached(&format!(
        "INSERT OR REPLACE INTO {table} (id, body) VALUES (?1, ?2)"
    ))?
    .execute([id.as_str(), body.as_str()])?;
    Ok(())
}

impl StagingStore for SqliteStaging {
    fn create(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path).map_err(|e| {
            FolioError::Storage(format!("cannot create {}: {e}", path.display()))
        })?;

        let db_path = path.join(STAGING_FILE);
        if db_path.exists() {
            return Err(FolioError::Storage(format!(
                "{} already holds a staging store",
                path.display()
            )));
        }

        let connection = Connection::open(&db_path)
            .map_err(|e| FolioError::from(e).context(db_path.display()))?;
        Self::configure(&connection)?;
        connection.execute_batch(SCHEMA)?;
        connection.execute(
            "INSERT INTO staging_meta (key, value) VALUES ('schema_version', ?1)",
            [SCHEMA_VERSION.to_string()],
        )?;

        tracing::debug!(path = %db_path.display(), "Created staging store");
        Ok(Self {
            connection,
            path: db_path,
        })
    }

    fn open(path: &Path) -> Result<Self> {
        let db_path = path.join(STAGING_FILE);
        if !db_path.is_file() {
            return Err(FolioError::Storage(format!(
                "no staging store found in {}",
                path.display()
            )));
        }

        let connection = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| FolioError::from(e).context(db_path.display()))?;
        Self::configure(&connection)?;

        let store = Self {
            connection,
            path: db_path,
        };
        store.check_version()?;

        tracing::debug!(path = %store.path.display(), "Opened staging store");
        Ok(store)
    }

    fn load(&mut self, dir: &Path, lookups: &Lookups) -> Result<LoadSummary> {
        let start = Instant::now();
        let mut summary = LoadSummary::default();

        for kind in SourceKind::STAGED {
            for path in source::source_files(dir, kind)? {
                let rows = self.load_file(&path, kind, lookups)?;
                tracing::info!(
                    kind = %kind,
                    file = %path.display(),
                    rows = rows,
                    "Staged source file"
                );
                summary.add_file(kind, rows);
            }
        }

        summary.keys = self.count_keys()?;
        summary.duration_seconds = start.elapsed().as_secs_f64();
        Ok(summary)
    }

    fn next_ids(&self, after: Option<&CompanyId>, limit: usize) -> Result<Vec<CompanyId>> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT id FROM companies WHERE id > ?1 ORDER BY id LIMIT ?2")?;
        let after = after.map(CompanyId::as_str).unwrap_or("");
        let rows = statement.query_map(rusqlite::params![after, limit as i64], |row| {
            row.get::<_, String>(0)
        })?;

        let mut ids = Vec::new();
        for id in rows {
            ids.push(CompanyId::new(id?).map_err(FolioError::Storage)?);
        }
        Ok(ids)
    }

    fn enrich_company(&self, company: &mut Company) -> Result<()> {
        let id = company.id.clone();
        if let Some(base) = read_one::<BaseCompany>(&self.connection, "base", &id)? {
            company.base = base;
        }
        company.tax_regime = read_one::<TaxRegime>(&self.connection, "tax_regimes", &id)?;
        company.establishments = self.bodies::<Establishment>("establishments", &id)?;
        company.partners = self.bodies::<Partner>("partners", &id)?;
        Ok(())
    }

    fn close(self) -> Result<()> {
        let path = self.path;
        self.connection
            .close()
            .map_err(|(_, e)| FolioError::from(e).context(format!("closing {}", path.display())))
    }
}
