//! Assembly of one company record from the staging store

use crate::adapters::database::CompanyRow;
use crate::core::lookups::Lookups;
use crate::core::privacy::Redactor;
use crate::core::staging::StagingStore;
use crate::domain::company::company_size;
use crate::domain::{Company, CompanyId, Result};

/// A serialised record plus the number of fields redacted from it
#[derive(Debug, Clone)]
pub struct BuiltRecord {
    pub row: CompanyRow,
    pub redacted: usize,
}

/// Reassemble, describe, redact and serialise the company `id`
pub fn build_record<S: StagingStore>(
    store: &S,
    id: CompanyId,
    lookups: &Lookups,
    redactor: &Redactor,
) -> Result<BuiltRecord> {
    let mut company = Company::new(id);
    store.enrich_company(&mut company)?;
    finish_record(company, lookups, redactor)
}

/// Apply record-level lookups and redaction to an enriched company, then
/// serialise it
pub fn finish_record(
    mut company: Company,
    lookups: &Lookups,
    redactor: &Redactor,
) -> Result<BuiltRecord> {
    apply_record_lookups(&mut company, lookups);
    let redacted = redactor.redact(&mut company);
    let json = serde_json::to_string(&company)?;
    Ok(BuiltRecord {
        row: CompanyRow::new(company.id.into_inner(), json),
        redacted,
    })
}

/// Resolve the descriptions that depend on the merged base company
///
/// Row-level descriptions (establishments, partners) are resolved while
/// staging. The base company may be spread over several rows, so its codes
/// are only final here.
pub fn apply_record_lookups(company: &mut Company, lookups: &Lookups) {
    let base = &company.base;
    company.legal_nature = lookups
        .legal_natures
        .describe(base.legal_nature_code.as_deref());
    company.responsible_qualification = lookups
        .qualifications
        .describe(base.responsible_qualification_code.as_deref());
    company.size = base
        .size_code
        .as_deref()
        .and_then(company_size)
        .map(str::to_string);
}
