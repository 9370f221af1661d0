//! Domain identifier types with validation
//!
//! Newtype wrappers for registry identifiers. The company identifier is the
//! 8-digit base registry number shared by every establishment of a company;
//! the establishment tax id is the full 14-digit number (base, 4-digit order,
//! 2 check digits).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of digits in a company identifier
pub const COMPANY_ID_LEN: usize = 8;

/// Company identifier newtype wrapper
///
/// Keys every record in the staging store and in the database.
///
/// # Examples
///
/// ```
/// use folio::domain::ids::CompanyId;
/// use std::str::FromStr;
///
/// let id = CompanyId::from_str("33683111").unwrap();
/// assert_eq!(id.as_str(), "33683111");
/// assert!(CompanyId::from_str("3368311A").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a new CompanyId, rejecting anything but exactly 8 ASCII digits
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() != COMPANY_ID_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!(
                "Company ID must be {COMPANY_ID_LEN} digits, got '{trimmed}'"
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the company ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompanyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CompanyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Full establishment tax id (base + order + check digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxId(String);

impl TaxId {
    /// Assembles a tax id from its three parts
    pub fn from_parts(company: &CompanyId, order: &str, check_digits: &str) -> Result<Self, String> {
        let order = order.trim();
        let check_digits = check_digits.trim();
        if order.len() != 4 || !order.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Establishment order must be 4 digits, got '{order}'"));
        }
        if check_digits.len() != 2 || !check_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Check digits must be 2 digits, got '{check_digits}'"));
        }
        Ok(Self(format!("{}{order}{check_digits}", company.as_str())))
    }

    /// Returns the tax id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The company identifier this establishment belongs to
    pub fn company_id(&self) -> CompanyId {
        CompanyId(self.0[..COMPANY_ID_LEN].to_string())
    }

    /// Formats as `00.000.000/0000-00`
    pub fn formatted(&self) -> String {
        let s = &self.0;
        format!(
            "{}.{}.{}/{}-{}",
            &s[0..2],
            &s[2..5],
            &s[5..8],
            &s[8..12],
            &s[12..14]
        )
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_id_valid() {
        let id = CompanyId::new("11111111").unwrap();
        assert_eq!(id.as_str(), "11111111");
        assert_eq!(id.to_string(), "11111111");
    }

    #[test]
    fn test_company_id_trims_whitespace() {
        let id = CompanyId::new(" 22222222 ").unwrap();
        assert_eq!(id.as_str(), "22222222");
    }

    #[test]
    fn test_company_id_invalid() {
        assert!(CompanyId::new("").is_err());
        assert!(CompanyId::new("1234567").is_err());
        assert!(CompanyId::new("123456789").is_err());
        assert!(CompanyId::new("1234567a").is_err());
    }

    #[test]
    fn test_company_id_ordering_is_lexicographic() {
        let a = CompanyId::new("01000000").unwrap();
        let b = CompanyId::new("10000000").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_tax_id_from_parts() {
        let company = CompanyId::new("33683111").unwrap();
        let tax_id = TaxId::from_parts(&company, "0002", "80").unwrap();
        assert_eq!(tax_id.as_str(), "33683111000280");
        assert_eq!(tax_id.formatted(), "33.683.111/0002-80");
        assert_eq!(tax_id.company_id(), company);
    }

    #[test]
    fn test_tax_id_rejects_bad_parts() {
        let company = CompanyId::new("33683111").unwrap();
        assert!(TaxId::from_parts(&company, "002", "80").is_err());
        assert!(TaxId::from_parts(&company, "0002", "8").is_err());
        assert!(TaxId::from_parts(&company, "00a2", "80").is_err());
    }
}
