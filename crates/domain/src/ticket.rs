// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Support tickets exchanged between vendors and administrators.

use crate::error::DomainError;
use crate::validation::{validate_message_body, validate_subject};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Ticket workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Waiting on staff
    Open,
    /// Staff is working on it
    InProgress,
    /// Staff replied and is waiting on the vendor
    AwaitingVendor,
    /// Staff considers it solved; the vendor may reopen it
    Resolved,
    /// Final
    Closed,
}

impl TicketStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::AwaitingVendor => "awaiting_vendor",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Open,
                Self::InProgress | Self::AwaitingVendor | Self::Resolved | Self::Closed
            ) | (
                Self::InProgress,
                Self::AwaitingVendor | Self::Resolved | Self::Closed
            ) | (
                Self::AwaitingVendor,
                Self::Open | Self::InProgress | Self::Resolved | Self::Closed
            ) | (Self::Resolved, Self::Open | Self::Closed)
        )
    }

    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, target: Self) -> Result<(), DomainError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidTicketTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }

    /// Status a ticket moves to after `party` posts a reply.
    ///
    /// A staff reply on an active ticket hands it to the vendor. A vendor
    /// reply on a ticket that was waiting on them, or already resolved,
    /// reopens it. Other combinations keep the current status.
    #[must_use]
    pub const fn after_reply(&self, party: TicketParty) -> Self {
        match (self, party) {
            (Self::Open | Self::InProgress, TicketParty::Admin) => Self::AwaitingVendor,
            (Self::AwaitingVendor | Self::Resolved, TicketParty::Vendor) => Self::Open,
            (status, _) => *status,
        }
    }
}

impl FromStr for TicketStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "awaiting_vendor" => Ok(Self::AwaitingVendor),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(DomainError::InvalidTicketStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl FromStr for TicketPriority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(DomainError::InvalidTicketPriority(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Billing,
    LeadQuality,
    Technical,
    Account,
    Other,
}

impl TicketCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::LeadQuality => "lead_quality",
            Self::Technical => "technical",
            Self::Account => "account",
            Self::Other => "other",
        }
    }
}

impl FromStr for TicketCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "billing" => Ok(Self::Billing),
            "lead_quality" => Ok(Self::LeadQuality),
            "technical" => Ok(Self::Technical),
            "account" => Ok(Self::Account),
            "other" => Ok(Self::Other),
            _ => Err(DomainError::InvalidTicketCategory(s.to_string())),
        }
    }
}

/// Which side of the conversation wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketParty {
    Admin,
    Vendor,
}

impl TicketParty {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Vendor => "vendor",
        }
    }
}

impl FromStr for TicketParty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "vendor" => Ok(Self::Vendor),
            _ => Err(DomainError::InvalidTicketStatus(format!(
                "unknown message author '{s}'"
            ))),
        }
    }
}

/// A support ticket opened by a vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportTicket {
    pub ticket_id: Option<i64>,
    pub vendor_id: i64,
    pub subject: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    /// Admin operator handling the ticket.
    pub assigned_to: Option<i64>,
    /// Lead the ticket is about, if any.
    pub lead_id: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl SupportTicket {
    /// Opens a new ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the subject is invalid.
    pub fn open(
        vendor_id: i64,
        subject: &str,
        category: TicketCategory,
        priority: TicketPriority,
        lead_id: Option<i64>,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            ticket_id: None,
            vendor_id,
            subject: validate_subject(subject)?,
            category,
            priority,
            status: TicketStatus::Open,
            assigned_to: None,
            lead_id,
            created_at: now,
            updated_at: now,
        })
    }

    #[must_use]
    pub fn id_or_zero(&self) -> i64 {
        self.ticket_id.unwrap_or_default()
    }
}

/// One message in a ticket thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketMessage {
    pub message_id: Option<i64>,
    pub ticket_id: i64,
    pub author_operator_id: i64,
    pub author: TicketParty,
    pub body: String,
    pub created_at: OffsetDateTime,
}

impl TicketMessage {
    /// # Errors
    ///
    /// Returns an error if the body is blank or too long.
    pub fn new(
        ticket_id: i64,
        author_operator_id: i64,
        author: TicketParty,
        body: &str,
        now: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            message_id: None,
            ticket_id,
            author_operator_id,
            author,
            body: validate_message_body(body)?,
            created_at: now,
        })
    }
}
