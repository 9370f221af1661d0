//! Source extract discovery and reading
//!
//! The extract is a directory of `;`-separated, header-less, ISO-8859-1 CSV
//! files, each either plain or wrapped in a `.zip` archive. Files are matched
//! to a [`SourceKind`] by case-insensitive name prefix.

pub mod fields;
pub mod rows;

use crate::domain::{FolioError, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Kinds of file found in the extract directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Companies,
    Establishments,
    Partners,
    TaxRegimes,
    Activities,
    StatusReasons,
    Municipalities,
    LegalNatures,
    Countries,
    Qualifications,
}

impl SourceKind {
    /// Kinds loaded into the staging store, in load order
    pub const STAGED: [SourceKind; 4] = [
        SourceKind::Companies,
        SourceKind::Establishments,
        SourceKind::Partners,
        SourceKind::TaxRegimes,
    ];

    /// Lowercase file name prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            SourceKind::Companies => "empresas",
            SourceKind::Establishments => "estabelecimentos",
            SourceKind::Partners => "socios",
            SourceKind::TaxRegimes => "simples",
            SourceKind::Activities => "cnaes",
            SourceKind::StatusReasons => "motivos",
            SourceKind::Municipalities => "municipios",
            SourceKind::LegalNatures => "naturezas",
            SourceKind::Countries => "paises",
            SourceKind::Qualifications => "qualificacoes",
        }
    }

    /// Number of columns in every row of this kind
    pub fn columns(&self) -> usize {
        match self {
            SourceKind::Companies => 7,
            SourceKind::Establishments => 30,
            SourceKind::Partners => 11,
            SourceKind::TaxRegimes => 7,
            _ => 2,
        }
    }

    fn matches(&self, file_name: &str) -> bool {
        file_name.to_ascii_lowercase().starts_with(self.prefix())
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Companies => "companies",
            SourceKind::Establishments => "establishments",
            SourceKind::Partners => "partners",
            SourceKind::TaxRegimes => "tax regimes",
            SourceKind::Activities => "activities",
            SourceKind::StatusReasons => "status reasons",
            SourceKind::Municipalities => "municipalities",
            SourceKind::LegalNatures => "legal natures",
            SourceKind::Countries => "countries",
            SourceKind::Qualifications => "qualifications",
        };
        write!(f, "{name}")
    }
}

/// List the files of one kind in `dir`, sorted by file name
///
/// Fails with [`FolioError::Input`] when the directory holds no file of
/// that kind.
pub fn source_files(dir: &Path, kind: SourceKind) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| FolioError::Input(format!("cannot read {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if kind.matches(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }

    if files.is_empty() {
        return Err(FolioError::Input(format!(
            "no {kind} files (prefix '{}') in {}",
            kind.prefix(),
            dir.display()
        )));
    }

    files.sort();
    Ok(files)
}

/// Call `f` with the decoded fields of every row in `path`
///
/// Zip archives are read entry by entry. Returns the number of rows read.
/// Errors carry the file (and archive entry) name and the line number.
pub fn for_each_record<F>(path: &Path, kind: SourceKind, mut f: F) -> Result<u64>
where
    F: FnMut(&[String]) -> Result<()>,
{
    let file = File::open(path)
        .map_err(|e| FolioError::Input(format!("cannot open {}: {e}", path.display())))?;

    if !is_zip(path) {
        return read_csv(file, &path.display().to_string(), kind, &mut f);
    }

    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| FolioError::from(e).context(path.display()))?;
    let mut count = 0;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| FolioError::from(e).context(path.display()))?;
        if entry.is_dir() {
            continue;
        }
        let source = format!("{}!{}", path.display(), entry.name());
        count += read_csv(entry, &source, kind, &mut f)?;
    }
    Ok(count)
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn read_csv<R, F>(reader: R, source: &str, kind: SourceKind, f: &mut F) -> Result<u64>
where
    R: Read,
    F: FnMut(&[String]) -> Result<()>,
{
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let expected = kind.columns();
    let mut record = csv::ByteRecord::new();
    let mut decoded = Vec::with_capacity(expected);
    let mut count = 0;

    loop {
        let more = csv
            .read_byte_record(&mut record)
            .map_err(|e| FolioError::from(e).context(source))?;
        if !more {
            break;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != expected {
            return Err(FolioError::Input(format!(
                "{source}:{line}: expected {expected} columns for {kind}, found {}",
                record.len()
            )));
        }

        decoded.clear();
        decoded.extend(record.iter().map(fields::decode_latin1));
        f(&decoded).map_err(|e| e.context(format!("{source}:{line}")))?;
        count += 1;
    }

    Ok(count)
}
