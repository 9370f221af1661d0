//! Domain error types
//!
//! This module defines the error hierarchy for Folio. Every failure in the
//! transform pipeline maps to one of a small set of kinds so that callers can
//! tell a bad configuration apart from bad input, a broken staging store, or a
//! failing database. Third-party error types never leak through the public API.

use thiserror::Error;

/// Main Folio error type
///
/// Each variant carries a human-readable message. As errors travel up through
/// the pipeline, [`FolioError::context`] prefixes the operation and path that
/// produced them while keeping the variant intact.
#[derive(Debug, Error)]
pub enum FolioError {
    /// Invalid configuration or invalid combination of options
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or malformed source extract or metadata files
    #[error("Input error: {0}")]
    Input(String),

    /// Staging store could not be created, opened, read, written or closed
    #[error("Staging storage error: {0}")]
    Storage(String),

    /// Database sink errors
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl FolioError {
    /// Prefix the error message with context, keeping the error kind
    ///
    /// # Examples
    ///
    /// ```
    /// use folio::domain::FolioError;
    ///
    /// let err = FolioError::Input("bad row".to_string()).context("loading /data");
    /// assert!(matches!(err, FolioError::Input(_)));
    /// assert_eq!(err.to_string(), "Input error: loading /data: bad row");
    /// ```
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        let wrap = |message: String| format!("{context}: {message}");
        match self {
            Self::Configuration(m) => Self::Configuration(wrap(m)),
            Self::Input(m) => Self::Input(wrap(m)),
            Self::Storage(m) => Self::Storage(wrap(m)),
            Self::Database(m) => Self::Database(wrap(m)),
            Self::Serialization(m) => Self::Serialization(wrap(m)),
            Self::Io(m) => Self::Io(wrap(m)),
            Self::Other(m) => Self::Other(wrap(m)),
        }
    }

    /// Short name of the error kind, used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Input(_) => "input",
            Self::Storage(_) => "storage",
            Self::Database(_) => "database",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for FolioError {
    fn from(err: std::io::Error) -> Self {
        FolioError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FolioError {
    fn from(err: toml::de::Error) -> Self {
        FolioError::Configuration(format!("TOML parse error: {err}"))
    }
}

// SQLite only backs the staging store
impl From<rusqlite::Error> for FolioError {
    fn from(err: rusqlite::Error) -> Self {
        FolioError::Storage(err.to_string())
    }
}

impl From<csv::Error> for FolioError {
    fn from(err: csv::Error) -> Self {
        FolioError::Input(format!("CSV error: {err}"))
    }
}

impl From<zip::result::ZipError> for FolioError {
    fn from(err: zip::result::ZipError) -> Self {
        FolioError::Input(format!("ZIP error: {err}"))
    }
}
