//! Company domain model
//!
//! A [`Company`] is the self-contained record written to the database: the
//! base company data, its establishments, its partners and its simplified tax
//! regime, keyed by [`CompanyId`]. The staging store holds the pieces
//! separately ([`BaseCompany`], [`Establishment`], [`Partner`], [`TaxRegime`])
//! and Phase 2 assembles them.

use super::ids::{CompanyId, TaxId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Base company data from the companies files
///
/// Several source rows may describe the same company. They are merged with
/// [`BaseCompany::merge`]: a later non-empty value overrides an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseCompany {
    /// Registered legal name
    pub legal_name: Option<String>,

    /// Legal nature code (resolved against the legal natures lookup)
    pub legal_nature_code: Option<String>,

    /// Qualification code of the person responsible for the company
    pub responsible_qualification_code: Option<String>,

    /// Share capital in BRL
    pub share_capital: Option<f64>,

    /// Company size code (`00`, `01`, `03`, `05`)
    pub size_code: Option<String>,

    /// Responsible federative entity (public administration only)
    pub federative_entity: Option<String>,
}

impl BaseCompany {
    /// Merge another row for the same company into this one
    pub fn merge(&mut self, other: BaseCompany) {
        merge_field(&mut self.legal_name, other.legal_name);
        merge_field(&mut self.legal_nature_code, other.legal_nature_code);
        merge_field(
            &mut self.responsible_qualification_code,
            other.responsible_qualification_code,
        );
        merge_field(&mut self.share_capital, other.share_capital);
        merge_field(&mut self.size_code, other.size_code);
        merge_field(&mut self.federative_entity, other.federative_entity);
    }
}

/// Economic activity with its description from the activities lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity code
    pub code: String,
    /// Activity description, if the code is known
    pub description: Option<String>,
}

/// One establishment (head office or branch) of a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
    /// Full 14-digit tax id
    pub tax_id: TaxId,
    pub kind_code: Option<String>,
    pub kind: Option<String>,
    pub trade_name: Option<String>,
    pub status_code: Option<String>,
    pub status: Option<String>,
    pub status_date: Option<NaiveDate>,
    pub status_reason_code: Option<String>,
    pub status_reason: Option<String>,
    pub foreign_city: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub activity_start_date: Option<NaiveDate>,
    pub main_activity: Option<Activity>,
    pub secondary_activities: Vec<Activity>,
    pub street_type: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
    pub municipality_code: Option<String>,
    pub municipality: Option<String>,
    pub phone_1: Option<String>,
    pub phone_2: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub special_status: Option<String>,
    pub special_status_date: Option<NaiveDate>,
}

/// Partner (shareholder or administrator) of a company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub kind_code: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    /// Partner tax id, already partially masked at the source for individuals
    pub tax_id: Option<String>,
    pub qualification_code: Option<String>,
    pub qualification: Option<String>,
    pub joined_at: Option<NaiveDate>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub legal_representative_tax_id: Option<String>,
    pub legal_representative_name: Option<String>,
    pub legal_representative_qualification_code: Option<String>,
    pub legal_representative_qualification: Option<String>,
    pub age_range_code: Option<String>,
    pub age_range: Option<String>,
}

/// Simplified tax regime (Simples Nacional and MEI) options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxRegime {
    pub simples_opted: Option<bool>,
    pub simples_opted_at: Option<NaiveDate>,
    pub simples_excluded_at: Option<NaiveDate>,
    pub mei_opted: Option<bool>,
    pub mei_opted_at: Option<NaiveDate>,
    pub mei_excluded_at: Option<NaiveDate>,
}

impl TaxRegime {
    /// Merge another row for the same company into this one
    pub fn merge(&mut self, other: TaxRegime) {
        merge_field(&mut self.simples_opted, other.simples_opted);
        merge_field(&mut self.simples_opted_at, other.simples_opted_at);
        merge_field(&mut self.simples_excluded_at, other.simples_excluded_at);
        merge_field(&mut self.mei_opted, other.mei_opted);
        merge_field(&mut self.mei_opted_at, other.mei_opted_at);
        merge_field(&mut self.mei_excluded_at, other.mei_excluded_at);
    }
}

/// The complete record for one company identifier
///
/// # Examples
///
/// ```
/// use folio::domain::{Company, CompanyId};
///
/// let company = Company::new(CompanyId::new("11111111").unwrap());
/// assert!(company.establishments.is_empty());
/// let json = serde_json::to_value(&company).unwrap();
/// assert_eq!(json["id"], "11111111");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Company identifier
    pub id: CompanyId,

    #[serde(flatten)]
    pub base: BaseCompany,

    /// Legal nature description
    pub legal_nature: Option<String>,

    /// Responsible qualification description
    pub responsible_qualification: Option<String>,

    /// Company size description
    pub size: Option<String>,

    pub tax_regime: Option<TaxRegime>,

    pub establishments: Vec<Establishment>,

    pub partners: Vec<Partner>,
}

impl Company {
    /// Create an empty record for an identifier
    pub fn new(id: CompanyId) -> Self {
        Self {
            id,
            base: BaseCompany::default(),
            legal_nature: None,
            responsible_qualification: None,
            size: None,
            tax_regime: None,
            establishments: Vec::new(),
            partners: Vec::new(),
        }
    }

    /// Whether the company is an individual entrepreneur, i.e. its
    /// establishments' addresses are a person's home address
    pub fn is_individual_entrepreneur(&self) -> bool {
        matches!(
            self.base.legal_nature_code.as_deref(),
            Some(code) if INDIVIDUAL_ENTREPRENEUR_NATURES.contains(&code)
        )
    }
}

/// Legal natures whose establishments are registered to a natural person
pub const INDIVIDUAL_ENTREPRENEUR_NATURES: [&str; 3] = ["2135", "4014", "4120"];

fn merge_field<T>(current: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *current = incoming;
    }
}

/// Description of a company size code
pub fn company_size(code: &str) -> Option<&'static str> {
    match code {
        "00" => Some("NÃO INFORMADO"),
        "01" => Some("MICRO EMPRESA"),
        "03" => Some("EMPRESA DE PEQUENO PORTE"),
        "05" => Some("DEMAIS"),
        _ => None,
    }
}

/// Description of an establishment kind code
pub fn establishment_kind(code: &str) -> Option<&'static str> {
    match code {
        "1" => Some("MATRIZ"),
        "2" => Some("FILIAL"),
        _ => None,
    }
}

/// Description of a registration status code
pub fn registration_status(code: &str) -> Option<&'static str> {
    match code {
        "01" | "1" => Some("NULA"),
        "02" | "2" => Some("ATIVA"),
        "03" | "3" => Some("SUSPENSA"),
        "04" | "4" => Some("INAPTA"),
        "08" | "8" => Some("BAIXADA"),
        _ => None,
    }
}

/// Description of a partner kind code
pub fn partner_kind(code: &str) -> Option<&'static str> {
    match code {
        "1" => Some("PESSOA JURÍDICA"),
        "2" => Some("PESSOA FÍSICA"),
        "3" => Some("ESTRANGEIRO"),
        _ => None,
    }
}

/// Description of a partner age range code
pub fn age_range(code: &str) -> Option<&'static str> {
    match code {
        "0" => Some("Não se aplica"),
        "1" => Some("Entre 0 a 12 anos"),
        "2" => Some("Entre 13 a 20 anos"),
        "3" => Some("Entre 21 a 30 anos"),
        "4" => Some("Entre 31 a 40 anos"),
        "5" => Some("Entre 41 a 50 anos"),
        "6" => Some("Entre 51 a 60 anos"),
        "7" => Some("Entre 61 a 70 anos"),
        "8" => Some("Entre 71 a 80 anos"),
        "9" => Some("Maiores de 80 anos"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_company_merge_prefers_later_values() {
        let mut base = BaseCompany {
            legal_name: Some("ACME LTDA".to_string()),
            share_capital: Some(1000.0),
            ..Default::default()
        };
        base.merge(BaseCompany {
            legal_name: Some("ACME COMERCIO LTDA".to_string()),
            size_code: Some("01".to_string()),
            ..Default::default()
        });

        assert_eq!(base.legal_name.as_deref(), Some("ACME COMERCIO LTDA"));
        assert_eq!(base.share_capital, Some(1000.0));
        assert_eq!(base.size_code.as_deref(), Some("01"));
    }

    #[test]
    fn test_tax_regime_merge_keeps_existing_when_missing() {
        let mut regime = TaxRegime {
            simples_opted: Some(true),
            ..Default::default()
        };
        regime.merge(TaxRegime {
            mei_opted: Some(false),
            ..Default::default()
        });
        assert_eq!(regime.simples_opted, Some(true));
        assert_eq!(regime.mei_opted, Some(false));
    }

    #[test]
    fn test_individual_entrepreneur() {
        let mut company = Company::new(CompanyId::new("11111111").unwrap());
        assert!(!company.is_individual_entrepreneur());

        company.base.legal_nature_code = Some("2135".to_string());
        assert!(company.is_individual_entrepreneur());

        company.base.legal_nature_code = Some("2062".to_string());
        assert!(!company.is_individual_entrepreneur());
    }

    #[test]
    fn test_fixed_descriptions() {
        assert_eq!(company_size("03"), Some("EMPRESA DE PEQUENO PORTE"));
        assert_eq!(company_size("99"), None);
        assert_eq!(establishment_kind("1"), Some("MATRIZ"));
        assert_eq!(registration_status("02"), Some("ATIVA"));
        assert_eq!(registration_status("8"), Some("BAIXADA"));
        assert_eq!(partner_kind("2"), Some("PESSOA FÍSICA"));
        assert_eq!(age_range("9"), Some("Maiores de 80 anos"));
    }

    #[test]
    fn test_company_serializes_base_fields_flat() {
        let mut company = Company::new(CompanyId::new("11111111").unwrap());
        company.base.legal_name = Some("ACME LTDA".to_string());
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["legal_name"], "ACME LTDA");
        assert!(json.get("base").is_none());
    }
}
