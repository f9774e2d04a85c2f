// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Leads: customer service requests routed to vendors.

use crate::error::DomainError;
use crate::lead_status::LeadStatus;
use crate::validation::{
    normalize_email, normalize_phone, validate_budget, validate_customer_name,
    validate_description, validate_location,
};
use crate::vendor::Vendor;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Duration, OffsetDateTime};

/// Days after taking a lead during which a refund may be requested.
pub const REFUND_WINDOW_DAYS: i64 = 7;

/// Maximum length of a service category slug.
const MAX_CATEGORY_LEN: usize = 64;

/// A normalized service category slug such as `plumbing` or `roof-repair`.
///
/// Input is trimmed, lowercased and has inner whitespace and underscores
/// folded into single dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceCategory(String);

impl ServiceCategory {
    /// Parses and normalizes a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is empty, too long, or contains
    /// characters other than ASCII letters, digits and dashes.
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let slug: String = raw
            .trim()
            .to_lowercase()
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<&str>>()
            .join("-");

        if slug.is_empty() {
            return Err(DomainError::InvalidCategory(String::from(
                "Category cannot be empty",
            )));
        }
        if slug.len() > MAX_CATEGORY_LEN {
            return Err(DomainError::InvalidCategory(format!(
                "Category must be at most {MAX_CATEGORY_LEN} characters"
            )));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DomainError::InvalidCategory(format!(
                "'{raw}' may only contain letters, digits and dashes"
            )));
        }
        Ok(Self(slug))
    }

    /// Returns the slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceCategory {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ServiceCategory> for String {
    fn from(value: ServiceCategory) -> Self {
        value.0
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a lead entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    /// Public submission form
    Web,
    /// Entered by an administrator
    Admin,
    /// Bulk CSV import
    Import,
}

impl LeadSource {
    /// Returns the string representation of the source.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Admin => "admin",
            Self::Import => "import",
        }
    }
}

impl FromStr for LeadSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "admin" => Ok(Self::Admin),
            "import" => Ok(Self::Import),
            _ => Err(DomainError::InvalidLeadSource(s.to_string())),
        }
    }
}

/// Raw customer input for a new lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    /// Customer full name.
    pub customer_name: String,
    /// Customer email address.
    pub customer_email: String,
    /// Customer phone number in any common format.
    pub customer_phone: String,
    /// Requested service category.
    pub category: String,
    /// Where the service is needed.
    pub location: String,
    /// Free-text description of the job.
    pub description: String,
    /// Optional budget in cents.
    pub budget_cents: Option<i64>,
    /// Optional preferred service date.
    pub preferred_date: Option<Date>,
}

/// Admin edits to a lead's customer-facing details.
///
/// `None` leaves a field unchanged. Budget and preferred date use a nested
/// option so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadUpdate {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub budget_cents: Option<Option<i64>>,
    pub preferred_date: Option<Option<Date>>,
}

/// A lead and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    /// Database identifier; `None` until persisted.
    pub lead_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub category: ServiceCategory,
    pub location: String,
    pub description: String,
    pub budget_cents: Option<i64>,
    pub preferred_date: Option<Date>,
    pub source: LeadSource,
    pub status: LeadStatus,
    /// Vendors allowed to take the lead while it is `assigned`.
    pub assigned_vendor_ids: Vec<i64>,
    /// Owning vendor once taken.
    pub taken_by: Option<i64>,
    pub taken_at: Option<OffsetDateTime>,
    /// Subscription whose quota paid for the take.
    pub subscription_id: Option<i64>,
    /// Status recorded when a refund was requested, restored on denial.
    pub status_before_refund: Option<LeadStatus>,
    pub refund_reason: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Lead {
    /// Validates a customer submission and builds a `pending` lead.
    ///
    /// # Errors
    ///
    /// Returns the first field validation error encountered.
    pub fn submit(
        input: &NewLead,
        source: LeadSource,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        validate_budget(input.budget_cents)?;
        Ok(Self {
            lead_id: None,
            customer_name: validate_customer_name(&input.customer_name)?,
            customer_email: normalize_email(&input.customer_email)?,
            customer_phone: normalize_phone(&input.customer_phone)?,
            category: ServiceCategory::new(&input.category)?,
            location: validate_location(&input.location)?,
            description: validate_description(&input.description)?,
            budget_cents: input.budget_cents,
            preferred_date: input.preferred_date,
            source,
            status: LeadStatus::Pending,
            assigned_vendor_ids: Vec::new(),
            taken_by: None,
            taken_at: None,
            subscription_id: None,
            status_before_refund: None,
            refund_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns a copy with the given detail edits applied and validated.
    ///
    /// # Errors
    ///
    /// Returns an error if any supplied field is invalid.
    pub fn with_update(&self, update: LeadUpdate, now: OffsetDateTime) -> Result<Self, DomainError> {
        let mut lead: Self = self.clone();
        if let Some(name) = update.customer_name {
            lead.customer_name = validate_customer_name(&name)?;
        }
        if let Some(email) = update.customer_email {
            lead.customer_email = normalize_email(&email)?;
        }
        if let Some(phone) = update.customer_phone {
            lead.customer_phone = normalize_phone(&phone)?;
        }
        if let Some(category) = update.category {
            lead.category = ServiceCategory::new(&category)?;
        }
        if let Some(location) = update.location {
            lead.location = validate_location(&location)?;
        }
        if let Some(description) = update.description {
            lead.description = validate_description(&description)?;
        }
        if let Some(budget) = update.budget_cents {
            validate_budget(budget)?;
            lead.budget_cents = budget;
        }
        if let Some(date) = update.preferred_date {
            lead.preferred_date = date;
        }
        lead.updated_at = now;
        Ok(lead)
    }

    /// Returns the lead id, or 0 for an unsaved lead.
    ///
    /// Only used for error reporting.
    #[must_use]
    pub fn id_or_zero(&self) -> i64 {
        self.lead_id.unwrap_or_default()
    }

    /// Returns true if `vendor_id` owns the lead.
    #[must_use]
    pub fn is_owned_by(&self, vendor_id: i64) -> bool {
        self.taken_by == Some(vendor_id)
    }

    /// Returns true if the vendor could take the lead in its current state.
    ///
    /// An `assigned` lead is limited to its assigned vendors. An `available`
    /// lead is open to any active vendor that serves its category.
    #[must_use]
    pub fn is_eligible(&self, vendor: &Vendor) -> bool {
        let Some(vendor_id) = vendor.vendor_id else {
            return false;
        };
        if !vendor.is_active {
            return false;
        }
        match self.status {
            LeadStatus::Assigned => self.assigned_vendor_ids.contains(&vendor_id),
            LeadStatus::Available => vendor.serves(&self.category),
            _ => false,
        }
    }

    /// Checks every precondition for `vendor` taking this lead.
    ///
    /// # Errors
    ///
    /// Returns an error if the lead is already owned, not distributed, or
    /// the vendor is inactive or not eligible.
    pub fn check_takeable_by(&self, vendor: &Vendor) -> Result<(), DomainError> {
        let lead_id: i64 = self.id_or_zero();
        let vendor_id: i64 = vendor.vendor_id.unwrap_or_default();

        if self.taken_by.is_some() {
            return Err(DomainError::LeadAlreadyTaken { lead_id });
        }
        if !self.status.is_takeable() {
            return Err(DomainError::LeadNotTakeable {
                lead_id,
                status: self.status.as_str().to_string(),
            });
        }
        if !vendor.is_active {
            return Err(DomainError::VendorInactive(vendor_id));
        }
        if !self.is_eligible(vendor) {
            return Err(DomainError::VendorNotEligible { lead_id, vendor_id });
        }
        Ok(())
    }

    /// Returns the instant after which refunds can no longer be requested.
    #[must_use]
    pub fn refund_deadline(&self) -> Option<OffsetDateTime> {
        self.taken_at
            .map(|taken_at| taken_at + Duration::days(REFUND_WINDOW_DAYS))
    }

    /// Returns true if `now` falls within the refund window.
    #[must_use]
    pub fn within_refund_window(&self, now: OffsetDateTime) -> bool {
        self.refund_deadline()
            .is_some_and(|deadline| now <= deadline)
    }
}

/// Sort order for lead listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSort {
    /// Most recently created first
    #[default]
    Newest,
    /// Oldest first
    Oldest,
    /// Most recently updated first
    Updated,
}

impl FromStr for LeadSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "updated" => Ok(Self::Updated),
            _ => Err(DomainError::InvalidLeadSort(s.to_string())),
        }
    }
}

/// Filters for lead listings. Every field is optional and filters combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub category: Option<ServiceCategory>,
    /// Leads owned by this vendor.
    pub vendor_id: Option<i64>,
    /// Case-insensitive substring over name, email, phone and description.
    pub search: Option<String>,
    pub created_after: Option<OffsetDateTime>,
    pub created_before: Option<OffsetDateTime>,
    pub sort: LeadSort,
}
