// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::lead::ServiceCategory;
use crate::validation::{normalize_email, normalize_phone, validate_business_name};
use time::OffsetDateTime;

/// Maximum length of the free-text service area description.
const MAX_SERVICE_AREAS_LEN: usize = 500;

/// A service provider that takes and works leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    /// Database identifier; `None` until persisted.
    pub vendor_id: Option<i64>,
    pub business_name: String,
    pub contact_email: String,
    pub phone: String,
    /// Categories this vendor serves. Empty means every category.
    pub categories: Vec<ServiceCategory>,
    /// Free-text description of where the vendor operates.
    pub service_areas: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

/// Editable vendor profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorProfileUpdate {
    pub business_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub categories: Option<Vec<String>>,
    pub service_areas: Option<String>,
}

impl Vendor {
    /// Creates a new active vendor with validated fields.
    ///
    /// Duplicate categories are collapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if any field fails validation.
    pub fn new(
        business_name: &str,
        contact_email: &str,
        phone: &str,
        categories: &[String],
        service_areas: &str,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            vendor_id: None,
            business_name: validate_business_name(business_name)?,
            contact_email: normalize_email(contact_email)?,
            phone: normalize_phone(phone)?,
            categories: parse_categories(categories)?,
            service_areas: validate_service_areas(service_areas)?,
            is_active: true,
            created_at: now,
        })
    }

    /// Returns true if the vendor serves `category`.
    #[must_use]
    pub fn serves(&self, category: &ServiceCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(category)
    }

    /// Returns a copy with the profile edits applied.
    ///
    /// # Errors
    ///
    /// Returns an error if any supplied field fails validation.
    pub fn with_profile(&self, update: VendorProfileUpdate) -> Result<Self, DomainError> {
        let mut vendor: Self = self.clone();
        if let Some(name) = update.business_name {
            vendor.business_name = validate_business_name(&name)?;
        }
        if let Some(email) = update.contact_email {
            vendor.contact_email = normalize_email(&email)?;
        }
        if let Some(phone) = update.phone {
            vendor.phone = normalize_phone(&phone)?;
        }
        if let Some(categories) = update.categories {
            vendor.categories = parse_categories(&categories)?;
        }
        if let Some(areas) = update.service_areas {
            vendor.service_areas = validate_service_areas(&areas)?;
        }
        Ok(vendor)
    }
}

fn parse_categories(raw: &[String]) -> Result<Vec<ServiceCategory>, DomainError> {
    let mut categories: Vec<ServiceCategory> = raw
        .iter()
        .map(|c| ServiceCategory::new(c))
        .collect::<Result<_, _>>()?;
    categories.sort();
    categories.dedup();
    Ok(categories)
}

fn validate_service_areas(raw: &str) -> Result<String, DomainError> {
    let areas: &str = raw.trim();
    if areas.chars().count() > MAX_SERVICE_AREAS_LEN {
        return Err(DomainError::InvalidLocation(format!(
            "Service areas must be at most {MAX_SERVICE_AREAS_LEN} characters"
        )));
    }
    Ok(areas.to_string())
}
