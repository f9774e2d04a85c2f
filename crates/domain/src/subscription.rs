// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Subscription plans and the lead quota they grant.
//!
//! A subscription's stored status only records explicit decisions
//! (`active` or `cancelled`). Exhaustion and expiry are derived from the
//! quota counters and the period end, see [`Subscription::effective_status`].

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Duration, OffsetDateTime};

/// Longest plan duration accepted, in days.
pub const MAX_PLAN_DURATION_DAYS: i64 = 366;

/// A purchasable bundle of leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub plan_id: Option<i64>,
    pub name: String,
    pub description: String,
    /// Number of leads the plan allows a vendor to take.
    pub lead_quota: i64,
    pub duration_days: i64,
    pub price_cents: i64,
    /// Inactive plans are hidden from vendors and cannot be purchased.
    pub is_active: bool,
}

impl SubscriptionPlan {
    /// Creates a new active plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the quota is not positive,
    /// the duration is outside `1..=366` days, or the price is negative.
    pub fn new(
        name: &str,
        description: &str,
        lead_quota: i64,
        duration_days: i64,
        price_cents: i64,
    ) -> Result<Self, DomainError> {
        let plan = Self {
            plan_id: None,
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            lead_quota,
            duration_days,
            price_cents,
            is_active: true,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Validates plan fields.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::InvalidPlan(String::from(
                "Plan name cannot be empty",
            )));
        }
        if self.lead_quota <= 0 {
            return Err(DomainError::InvalidPlan(format!(
                "Lead quota must be positive, got {}",
                self.lead_quota
            )));
        }
        if !(1..=MAX_PLAN_DURATION_DAYS).contains(&self.duration_days) {
            return Err(DomainError::InvalidPlan(format!(
                "Duration must be between 1 and {MAX_PLAN_DURATION_DAYS} days, got {}",
                self.duration_days
            )));
        }
        if self.price_cents < 0 {
            return Err(DomainError::InvalidPlan(format!(
                "Price must not be negative, got {}",
                self.price_cents
            )));
        }
        Ok(())
    }
}

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Within its period with quota remaining
    Active,
    /// Every lead in the quota has been used
    Exhausted,
    /// The period has ended
    Expired,
    /// Cancelled by an administrator
    Cancelled,
}

impl SubscriptionStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Exhausted => "exhausted",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "exhausted" => Ok(Self::Exhausted),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidSubscriptionStatus(s.to_string())),
        }
    }
}

/// A vendor's purchase of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub subscription_id: Option<i64>,
    pub vendor_id: i64,
    pub plan_id: i64,
    /// Copied from the plan at purchase so later plan edits do not apply.
    pub lead_quota: i64,
    pub leads_used: i64,
    pub starts_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
    /// Stored status; see [`Subscription::effective_status`].
    pub status: SubscriptionStatus,
    /// External payment reference, if any.
    pub payment_reference: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Subscription {
    /// Starts a subscription to `plan` at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan is unsaved or no longer offered.
    pub fn start(
        vendor_id: i64,
        plan: &SubscriptionPlan,
        payment_reference: Option<String>,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        let Some(plan_id) = plan.plan_id else {
            return Err(DomainError::InvalidPlan(String::from(
                "Plan has not been saved",
            )));
        };
        if !plan.is_active {
            return Err(DomainError::PlanInactive(plan_id));
        }
        plan.validate()?;

        Ok(Self {
            subscription_id: None,
            vendor_id,
            plan_id,
            lead_quota: plan.lead_quota,
            leads_used: 0,
            starts_at: now,
            ends_at: now + Duration::days(plan.duration_days),
            status: SubscriptionStatus::Active,
            payment_reference: payment_reference
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            created_at: now,
        })
    }

    /// Leads still available to take.
    #[must_use]
    pub fn remaining(&self) -> i64 {
        (self.lead_quota - self.leads_used).max(0)
    }

    /// Status as of `now`.
    ///
    /// Cancellation wins over expiry, which wins over exhaustion.
    #[must_use]
    pub fn effective_status(&self, now: OffsetDateTime) -> SubscriptionStatus {
        if self.status == SubscriptionStatus::Cancelled {
            SubscriptionStatus::Cancelled
        } else if now >= self.ends_at {
            SubscriptionStatus::Expired
        } else if self.leads_used >= self.lead_quota {
            SubscriptionStatus::Exhausted
        } else {
            SubscriptionStatus::Active
        }
    }

    /// Checks that one more lead can be taken against this subscription.
    ///
    /// # Errors
    ///
    /// Returns `QuotaExhausted` when the quota is used up and
    /// `NoActiveSubscription` when it is expired or cancelled.
    pub fn check_can_consume(&self, now: OffsetDateTime) -> Result<(), DomainError> {
        match self.effective_status(now) {
            SubscriptionStatus::Active => Ok(()),
            SubscriptionStatus::Exhausted => Err(DomainError::QuotaExhausted {
                vendor_id: self.vendor_id,
            }),
            SubscriptionStatus::Expired | SubscriptionStatus::Cancelled => {
                Err(DomainError::NoActiveSubscription {
                    vendor_id: self.vendor_id,
                })
            }
        }
    }
}

/// Rejects a purchase while the vendor still has usable quota.
///
/// A new subscription may be bought once the current one is exhausted,
/// expired or cancelled.
///
/// # Errors
///
/// Returns `ActiveSubscriptionExists` if `current` is still active.
pub fn ensure_can_purchase(
    vendor_id: i64,
    current: Option<&Subscription>,
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    match current {
        Some(existing) if existing.effective_status(now) == SubscriptionStatus::Active => {
            Err(DomainError::ActiveSubscriptionExists {
                vendor_id,
                subscription_id: existing.subscription_id.unwrap_or_default(),
            })
        }
        _ => Ok(()),
    }
}
