// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lead status tracking and transition logic.
//!
//! A lead moves from intake (`pending`) through distribution (`available`
//! or `assigned`), is claimed by exactly one vendor (`taken`) and is then
//! worked through the sales pipeline. Refund requests form a side branch
//! that either ends in `refunded` or returns the lead to where it was.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lead lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Submitted by a customer, awaiting admin triage
    Pending,
    /// Open to every eligible vendor
    Available,
    /// Restricted to an explicit set of vendors
    Assigned,
    /// Claimed by one vendor
    Taken,
    /// Vendor has reached the customer
    Contacted,
    /// Customer wants to proceed
    Interested,
    /// Customer declined
    NotInterested,
    /// Appointment booked
    Scheduled,
    /// Work under way
    InProgress,
    /// Work finished
    Completed,
    /// Completed and billed
    Converted,
    /// Withdrawn by an admin or the owning vendor
    Cancelled,
    /// Vendor asked for the lead to be credited back
    RefundRequested,
    /// Refund approved; quota credited
    Refunded,
}

/// Every status, in pipeline order.
pub const ALL_LEAD_STATUSES: [LeadStatus; 14] = [
    LeadStatus::Pending,
    LeadStatus::Available,
    LeadStatus::Assigned,
    LeadStatus::Taken,
    LeadStatus::Contacted,
    LeadStatus::Interested,
    LeadStatus::NotInterested,
    LeadStatus::Scheduled,
    LeadStatus::InProgress,
    LeadStatus::Completed,
    LeadStatus::Converted,
    LeadStatus::Cancelled,
    LeadStatus::RefundRequested,
    LeadStatus::Refunded,
];

impl LeadStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Taken => "taken",
            Self::Contacted => "contacted",
            Self::Interested => "interested",
            Self::NotInterested => "not_interested",
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Converted => "converted",
            Self::Cancelled => "cancelled",
            Self::RefundRequested => "refund_requested",
            Self::Refunded => "refunded",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        ALL_LEAD_STATUSES
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidLeadStatus {
                status: s.to_string(),
            })
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NotInterested | Self::Converted | Self::Cancelled | Self::Refunded
        )
    }

    /// Returns true if a vendor may claim a lead in this status.
    #[must_use]
    pub const fn is_takeable(&self) -> bool {
        matches!(self, Self::Available | Self::Assigned)
    }

    /// Returns true once the lead has an owning vendor.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        matches!(
            self,
            Self::Taken
                | Self::Contacted
                | Self::Interested
                | Self::NotInterested
                | Self::Scheduled
                | Self::InProgress
                | Self::Completed
                | Self::Converted
                | Self::RefundRequested
                | Self::Refunded
        )
    }

    /// Returns true for the pipeline steps a vendor drives after taking a lead.
    #[must_use]
    pub const fn is_pipeline(&self) -> bool {
        matches!(
            self,
            Self::Contacted
                | Self::Interested
                | Self::NotInterested
                | Self::Scheduled
                | Self::InProgress
                | Self::Completed
                | Self::Converted
        )
    }

    /// Returns true if a refund may be requested from this status.
    #[must_use]
    pub const fn allows_refund_request(&self) -> bool {
        matches!(self, Self::Taken | Self::Contacted)
    }

    /// Checks the static transition table.
    ///
    /// Leaving `refund_requested` is not covered here because the legal
    /// target depends on the status recorded before the request; see
    /// [`LeadStatus::validate_refund_resolution`].
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Available | Self::Assigned | Self::Cancelled
            ) | (
                Self::Available,
                Self::Assigned | Self::Taken | Self::Cancelled
            ) | (
                Self::Assigned,
                Self::Available | Self::Assigned | Self::Taken | Self::Cancelled
            ) | (
                Self::Taken,
                Self::Contacted | Self::Cancelled | Self::RefundRequested
            ) | (
                Self::Contacted,
                Self::Interested | Self::NotInterested | Self::RefundRequested
            ) | (
                Self::Interested,
                Self::Scheduled | Self::NotInterested | Self::Cancelled
            ) | (Self::Scheduled, Self::InProgress | Self::Cancelled)
                | (Self::InProgress, Self::Completed | Self::Cancelled)
                | (Self::Completed, Self::Converted)
                | (Self::RefundRequested, Self::Refunded)
        )
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        if self.can_transition_to(new_status) {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by lead lifecycle rules".to_string(),
            })
        }
    }

    /// Validates the way out of `refund_requested`.
    ///
    /// Approval leads to `refunded`; denial must restore exactly the status
    /// the lead had when the refund was requested.
    ///
    /// # Errors
    ///
    /// Returns an error if this status is not `refund_requested` or the
    /// target is neither `refunded` nor the recorded prior status.
    pub fn validate_refund_resolution(
        &self,
        target: Self,
        before_refund: Option<Self>,
    ) -> Result<(), DomainError> {
        if *self != Self::RefundRequested {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
                reason: "no refund request is pending".to_string(),
            });
        }
        if target == Self::Refunded || Some(target) == before_refund {
            return Ok(());
        }
        Err(DomainError::InvalidStatusTransition {
            from: self.as_str().to_string(),
            to: target.as_str().to_string(),
            reason: "a denied refund must restore the previous status".to_string(),
        })
    }
}

impl FromStr for LeadStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
