// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use leadhub_audit::{AuditEvent, StateSnapshot};
use leadhub_domain::{
    Lead, LeadStatus, Subscription, SupportTicket, TicketMessage, Vendor,
};
use time::OffsetDateTime;

/// Who is acting, as far as lifecycle rules are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// A marketplace administrator.
    Admin {
        /// The admin's operator id.
        operator_id: i64,
    },
    /// An operator acting for a vendor.
    Vendor {
        /// The operator id.
        operator_id: i64,
        /// The vendor the operator belongs to.
        vendor_id: i64,
    },
    /// The server itself (bootstrap, imports).
    System,
}

impl Authority {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. } | Self::System)
    }

    /// Returns the vendor id when acting for a vendor.
    #[must_use]
    pub const fn vendor_id(&self) -> Option<i64> {
        match self {
            Self::Vendor { vendor_id, .. } => Some(*vendor_id),
            Self::Admin { .. } | Self::System => None,
        }
    }

    /// Returns the operator id, or 0 for the system.
    #[must_use]
    pub const fn operator_id(&self) -> i64 {
        match self {
            Self::Admin { operator_id } | Self::Vendor { operator_id, .. } => *operator_id,
            Self::System => 0,
        }
    }
}

/// Everything a lead command may need besides the lead itself.
///
/// `vendor` and `subscription` are required by `Take` (the taking vendor
/// and its current subscription), `vendor` by `Reassign` (the new owner)
/// and `subscription` by `RequestRefund` (the subscription that paid for
/// the lead). Other commands ignore them.
#[derive(Debug, Clone, Copy)]
pub struct LeadContext<'a> {
    pub authority: Authority,
    pub now: OffsetDateTime,
    pub vendor: Option<&'a Vendor>,
    pub subscription: Option<&'a Subscription>,
}

impl<'a> LeadContext<'a> {
    #[must_use]
    pub const fn new(authority: Authority, now: OffsetDateTime) -> Self {
        Self {
            authority,
            now,
            vendor: None,
            subscription: None,
        }
    }

    #[must_use]
    pub const fn with_vendor(mut self, vendor: &'a Vendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    #[must_use]
    pub const fn with_subscription(mut self, subscription: &'a Subscription) -> Self {
        self.subscription = Some(subscription);
        self
    }
}

/// Quota side effect of a lead transition, applied by persistence in the
/// same transaction as the lead update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaEffect {
    None,
    /// Use one lead from the subscription.
    Consume { subscription_id: i64 },
    /// Return one lead to the subscription.
    Credit { subscription_id: i64 },
}

/// One row of lead status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub lead_id: i64,
    pub from_status: LeadStatus,
    pub to_status: LeadStatus,
    pub changed_by_operator_id: Option<i64>,
    pub notes: Option<String>,
    pub changed_at: OffsetDateTime,
}

/// The result of a successful lead transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadTransition {
    /// The lead after the transition.
    pub new_lead: Lead,
    /// The status history entry; `from == to` for non-status changes such
    /// as reassignment.
    pub status_change: StatusChange,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
    pub quota: QuotaEffect,
}

/// The result of a ticket command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTransition {
    pub new_ticket: SupportTicket,
    /// The message to append, for replies and newly opened tickets.
    pub message: Option<TicketMessage>,
    pub audit_event: AuditEvent,
}

/// The result of a subscription purchase or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionTransition {
    pub subscription: Subscription,
    pub audit_event: AuditEvent,
}

/// Converts a lead to a snapshot for audit purposes.
#[must_use]
pub fn lead_snapshot(lead: &Lead) -> StateSnapshot {
    let assigned: Vec<String> = lead
        .assigned_vendor_ids
        .iter()
        .map(ToString::to_string)
        .collect();
    StateSnapshot::new(format!(
        "status={},taken_by={},assigned=[{}],subscription={}",
        lead.status,
        lead.taken_by.map_or_else(|| String::from("none"), |v| v.to_string()),
        assigned.join(","),
        lead.subscription_id
            .map_or_else(|| String::from("none"), |s| s.to_string()),
    ))
}

/// Converts a ticket to a snapshot for audit purposes.
#[must_use]
pub fn ticket_snapshot(ticket: &SupportTicket) -> StateSnapshot {
    StateSnapshot::new(format!(
        "status={},priority={},assigned_to={}",
        ticket.status.as_str(),
        ticket.priority.as_str(),
        ticket
            .assigned_to
            .map_or_else(|| String::from("none"), |o| o.to_string()),
    ))
}

/// Converts a subscription to a snapshot for audit purposes.
#[must_use]
pub fn subscription_snapshot(subscription: &Subscription, now: OffsetDateTime) -> StateSnapshot {
    StateSnapshot::new(format!(
        "status={},used={}/{}",
        subscription.effective_status(now).as_str(),
        subscription.leads_used,
        subscription.lead_quota,
    ))
}
