//! Code → description lookup tables
//!
//! The extract ships six small auxiliary files mapping codes to their
//! descriptions. They are loaded once, before either phase, and shared
//! read-only behind an `Arc`.

use crate::core::source::{self, fields, SourceKind};
use crate::domain::{FolioError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Immutable code → description map for one auxiliary file kind
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: HashMap<String, String>,
}

impl LookupTable {
    /// Load every file of `kind` from `dir`
    pub fn from_dir(dir: &Path, kind: SourceKind) -> Result<Self> {
        let mut table = Self::default();
        for path in source::source_files(dir, kind)? {
            source::for_each_record(&path, kind, |row| {
                let code = normalize_code(&row[0]);
                if code.is_empty() {
                    return Err(FolioError::Input(format!("empty {kind} code")));
                }
                if let Some(description) = fields::text(&row[1]) {
                    table.entries.insert(code, description);
                }
                Ok(())
            })?;
        }
        Ok(table)
    }

    /// Build a table from in-memory pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(code, description)| (normalize_code(code.as_ref()), description.into()))
            .collect();
        Self { entries }
    }

    /// Description for `code`; codes compare without leading zeros
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(&normalize_code(code)).map(String::as_str)
    }

    /// Description for an optional code, owned
    pub fn describe(&self, code: Option<&str>) -> Option<String> {
        code.and_then(|c| self.get(c)).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_code(code: &str) -> String {
    let trimmed = code.trim();
    let stripped = trimmed.trim_start_matches('0');
    if stripped.is_empty() && !trimmed.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// The full set of lookup tables used by both phases
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub activities: LookupTable,
    pub status_reasons: LookupTable,
    pub municipalities: LookupTable,
    pub legal_natures: LookupTable,
    pub countries: LookupTable,
    pub qualifications: LookupTable,
}

impl Lookups {
    /// Load all six tables from the extract directory
    ///
    /// Fails with [`FolioError::Input`] if any table is missing or malformed.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let lookups = Self {
            activities: LookupTable::from_dir(dir, SourceKind::Activities)?,
            status_reasons: LookupTable::from_dir(dir, SourceKind::StatusReasons)?,
            municipalities: LookupTable::from_dir(dir, SourceKind::Municipalities)?,
            legal_natures: LookupTable::from_dir(dir, SourceKind::LegalNatures)?,
            countries: LookupTable::from_dir(dir, SourceKind::Countries)?,
            qualifications: LookupTable::from_dir(dir, SourceKind::Qualifications)?,
        };

        tracing::info!(
            activities = lookups.activities.len(),
            status_reasons = lookups.status_reasons.len(),
            municipalities = lookups.municipalities.len(),
            legal_natures = lookups.legal_natures.len(),
            countries = lookups.countries.len(),
            qualifications = lookups.qualifications.len(),
            "Loaded lookup tables"
        );

        Ok(lookups)
    }
}
