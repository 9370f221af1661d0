//! Field-level parsing for extract rows
//!
//! The extract is ISO-8859-1 text. Every byte maps to the Unicode code point
//! of the same value, so decoding never fails.

use crate::domain::{FolioError, Result};
use chrono::NaiveDate;

/// Decode an ISO-8859-1 field into a `String`
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Trimmed text, `None` when empty
pub fn text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a `YYYYMMDD` date; `0`, `00000000` and empty mean no date
pub fn date(value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.bytes().all(|b| b == b'0') {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .map(Some)
        .map_err(|e| FolioError::Input(format!("invalid date '{trimmed}': {e}")))
}

/// Parse a decimal using `,` as the decimal separator
pub fn decimal(value: &str) -> Result<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|e| FolioError::Input(format!("invalid decimal '{trimmed}': {e}")))
}

/// Parse an `S`/`N` flag
pub fn flag(value: &str) -> Result<Option<bool>> {
    match value.trim() {
        "" => Ok(None),
        "S" | "s" => Ok(Some(true)),
        "N" | "n" => Ok(Some(false)),
        other => Err(FolioError::Input(format!("invalid S/N flag '{other}'"))),
    }
}

/// Join an area code and a number into a single phone string
pub fn phone(area_code: &str, number: &str) -> Option<String> {
    let area_code = area_code.trim();
    let number = number.trim();
    if number.is_empty() {
        return None;
    }
    Some(format!("{area_code}{number}"))
}

/// Split a comma-separated code list
pub fn codes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}
