//! Personal data redaction
//!
//! With privacy mode on, contact details and personal tax ids are removed
//! from each record before it is serialised. Redacted fields become `null`.
//! For individual entrepreneurs the establishment address is the owner's
//! home address, so the street number and complement go too.

use crate::domain::Company;

/// Kinds of personal data removed by the [`Redactor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonalField {
    Email,
    Phone,
    Fax,
    AddressNumber,
    AddressComplement,
    PartnerTaxId,
    RepresentativeTaxId,
}

/// Removes personal data from assembled records
#[derive(Debug, Clone, Copy, Default)]
pub struct Redactor {
    enabled: bool,
}

impl Redactor {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Redact `company` in place, returning the number of fields cleared
    pub fn redact(&self, company: &mut Company) -> usize {
        if !self.enabled {
            return 0;
        }

        let mut cleared = 0;
        let individual = company.is_individual_entrepreneur();

        for establishment in &mut company.establishments {
            cleared += clear(&mut establishment.email, PersonalField::Email);
            cleared += clear(&mut establishment.phone_1, PersonalField::Phone);
            cleared += clear(&mut establishment.phone_2, PersonalField::Phone);
            cleared += clear(&mut establishment.fax, PersonalField::Fax);
            if individual {
                cleared += clear(&mut establishment.number, PersonalField::AddressNumber);
                cleared += clear(&mut establishment.complement, PersonalField::AddressComplement);
            }
        }

        for partner in &mut company.partners {
            cleared += clear(&mut partner.tax_id, PersonalField::PartnerTaxId);
            cleared += clear(
                &mut partner.legal_representative_tax_id,
                PersonalField::RepresentativeTaxId,
            );
        }

        cleared
    }
}

fn clear(value: &mut Option<String>, field: PersonalField) -> usize {
    match value.take() {
        Some(_) => {
            tracing::trace!(field = ?field, "Redacted field");
            1
        }
        None => 0,
    }
}
