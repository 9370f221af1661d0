//! Execution mode resolution

use crate::domain::{FolioError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which phases a transform run executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformMode {
    /// Build the staging store only and keep it
    StepOne,

    /// Write records from an existing staging store
    StepTwo(PathBuf),

    /// Stage into a temporary directory, write, then clean up
    Both,
}

impl TransformMode {
    /// Resolve the mode from the two CLI switches
    ///
    /// A whitespace-only `step_two` path counts as empty; any other path is
    /// used exactly as given. Pure: nothing is created or opened here.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::Configuration`] when both `step_one` and a
    /// `step_two` path are given.
    ///
    /// # Example
    ///
    /// ```
    /// use folio::core::pipeline::TransformMode;
    ///
    /// assert_eq!(TransformMode::resolve(false, "  ").unwrap(), TransformMode::Both);
    /// assert!(TransformMode::resolve(true, "/tmp/staging").is_err());
    /// ```
    pub fn resolve(step_one: bool, step_two: &str) -> Result<Self> {
        match (step_one, step_two.trim().is_empty()) {
            (true, false) => Err(FolioError::Configuration(format!(
                "step one and step two ({step_two}) cannot be combined; omit both to run the whole pipeline"
            ))),
            (true, true) => Ok(Self::StepOne),
            (false, false) => Ok(Self::StepTwo(PathBuf::from(step_two))),
            (false, true) => Ok(Self::Both),
        }
    }

    /// Whether the run writes to the database
    pub fn needs_database(&self) -> bool {
        !matches!(self, Self::StepOne)
    }

    /// Whether the run builds a staging store
    pub fn runs_step_one(&self) -> bool {
        !matches!(self, Self::StepTwo(_))
    }

    /// Caller-supplied staging directory, for step two
    pub fn staging_path(&self) -> Option<&Path> {
        match self {
            Self::StepTwo(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepOne => write!(f, "step-one"),
            Self::StepTwo(_) => write!(f, "step-two"),
            Self::Both => write!(f, "both"),
        }
    }
}
