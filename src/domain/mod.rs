//! Domain models and types for Folio.
//!
//! This module contains the core domain models and types for Folio.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`CompanyId`], [`TaxId`])
//! - **Domain models** ([`Company`], [`Establishment`], [`Partner`], [`TaxRegime`])
//! - **Error types** ([`FolioError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers are validated on construction, so a value of type
//! [`CompanyId`] is always an 8-digit registry number:
//!
//! ```rust
//! use folio::domain::{CompanyId, TaxId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let company = CompanyId::new("33683111")?;
//! let head_office = TaxId::from_parts(&company, "0001", "80")?;
//! assert_eq!(head_office.company_id(), company);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, FolioError>`]:
//!
//! ```rust
//! use folio::domain::{FolioError, Result};
//!
//! fn example() -> Result<()> {
//!     // Errors are automatically converted using the ? operator
//!     let config = folio::config::FolioConfig::from_file("folio.toml")?;
//!     Ok(())
//! }
//! ```

pub mod company;
pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use company::{Activity, BaseCompany, Company, Establishment, Partner, TaxRegime};
pub use errors::FolioError;
pub use ids::{CompanyId, TaxId};
pub use result::Result;
