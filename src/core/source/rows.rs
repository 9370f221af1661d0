//! Row → domain conversion for the four staged file kinds
//!
//! Row-level lookups (activities, status reasons, municipalities, countries,
//! qualifications) and the fixed code descriptions that belong to a single
//! row are resolved here, at load time.

use super::fields;
use crate::core::lookups::Lookups;
use crate::domain::company::{self, Activity, BaseCompany, Establishment, Partner, TaxRegime};
use crate::domain::{CompanyId, FolioError, Result, TaxId};

fn company_id(value: &str) -> Result<CompanyId> {
    CompanyId::new(value).map_err(FolioError::Input)
}

fn described(code: &Option<String>, describe: fn(&str) -> Option<&'static str>) -> Option<String> {
    code.as_deref().and_then(describe).map(str::to_string)
}

/// Base company row (7 columns)
pub fn parse_company(row: &[String]) -> Result<(CompanyId, BaseCompany)> {
    let id = company_id(&row[0])?;
    let base = BaseCompany {
        legal_name: fields::text(&row[1]),
        legal_nature_code: fields::text(&row[2]),
        responsible_qualification_code: fields::text(&row[3]),
        share_capital: fields::decimal(&row[4])?,
        size_code: fields::text(&row[5]),
        federative_entity: fields::text(&row[6]),
    };
    Ok((id, base))
}

/// Establishment row (30 columns)
pub fn parse_establishment(row: &[String], lookups: &Lookups) -> Result<(CompanyId, Establishment)> {
    let id = company_id(&row[0])?;
    let tax_id = TaxId::from_parts(&id, &row[1], &row[2]).map_err(FolioError::Input)?;

    let kind_code = fields::text(&row[3]);
    let status_code = fields::text(&row[5]);
    let status_reason_code = fields::text(&row[7]);
    let country_code = fields::text(&row[9]);
    let municipality_code = fields::text(&row[20]);

    let activity = |code: String| Activity {
        description: lookups.activities.get(&code).map(str::to_string),
        code,
    };

    let establishment = Establishment {
        tax_id,
        kind: described(&kind_code, company::establishment_kind),
        kind_code,
        trade_name: fields::text(&row[4]),
        status: described(&status_code, company::registration_status),
        status_code,
        status_date: fields::date(&row[6])?,
        status_reason: lookups.status_reasons.describe(status_reason_code.as_deref()),
        status_reason_code,
        foreign_city: fields::text(&row[8]),
        country: lookups.countries.describe(country_code.as_deref()),
        country_code,
        activity_start_date: fields::date(&row[10])?,
        main_activity: fields::text(&row[11]).map(activity),
        secondary_activities: fields::codes(&row[12]).into_iter().map(activity).collect(),
        street_type: fields::text(&row[13]),
        street: fields::text(&row[14]),
        number: fields::text(&row[15]),
        complement: fields::text(&row[16]),
        neighborhood: fields::text(&row[17]),
        postal_code: fields::text(&row[18]),
        state: fields::text(&row[19]),
        municipality: lookups.municipalities.describe(municipality_code.as_deref()),
        municipality_code,
        phone_1: fields::phone(&row[21], &row[22]),
        phone_2: fields::phone(&row[23], &row[24]),
        fax: fields::phone(&row[25], &row[26]),
        email: fields::text(&row[27]),
        special_status: fields::text(&row[28]),
        special_status_date: fields::date(&row[29])?,
    };
    Ok((id, establishment))
}

/// Partner row (11 columns)
pub fn parse_partner(row: &[String], lookups: &Lookups) -> Result<(CompanyId, Partner)> {
    let id = company_id(&row[0])?;

    let kind_code = fields::text(&row[1]);
    let qualification_code = fields::text(&row[4]);
    let country_code = fields::text(&row[6]);
    let representative_qualification_code = fields::text(&row[9]);
    let age_range_code = fields::text(&row[10]);

    let partner = Partner {
        kind: described(&kind_code, company::partner_kind),
        kind_code,
        name: fields::text(&row[2]),
        tax_id: fields::text(&row[3]),
        qualification: lookups.qualifications.describe(qualification_code.as_deref()),
        qualification_code,
        joined_at: fields::date(&row[5])?,
        country: lookups.countries.describe(country_code.as_deref()),
        country_code,
        legal_representative_tax_id: fields::text(&row[7]),
        legal_representative_name: fields::text(&row[8]),
        legal_representative_qualification: lookups
            .qualifications
            .describe(representative_qualification_code.as_deref()),
        legal_representative_qualification_code: representative_qualification_code,
        age_range: described(&age_range_code, company::age_range),
        age_range_code,
    };
    Ok((id, partner))
}

/// Simplified tax regime row (7 columns)
pub fn parse_tax_regime(row: &[String]) -> Result<(CompanyId, TaxRegime)> {
    let id = company_id(&row[0])?;
    let regime = TaxRegime {
        simples_opted: fields::flag(&row[1])?,
        simples_opted_at: fields::date(&row[2])?,
        simples_excluded_at: fields::date(&row[3])?,
        mei_opted: fields::flag(&row[4])?,
        mei_opted_at: fields::date(&row[5])?,
        mei_excluded_at: fields::date(&row[6])?,
    };
    Ok((id, regime))
}
