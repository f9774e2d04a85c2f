// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use leadhub_domain::{LeadStatus, TicketStatus};

/// A command represents operator intent against a single lead, as data only.
///
/// Commands are the only way to request lead lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a pending (or assigned) lead to every eligible vendor.
    Publish,
    /// Restrict a lead to an explicit set of vendors.
    Assign {
        /// Vendors allowed to take the lead.
        vendor_ids: Vec<i64>,
    },
    /// Claim a lead for a vendor, consuming one lead of quota.
    Take {
        /// The vendor taking the lead.
        vendor_id: i64,
    },
    /// Move an owned lead along the sales pipeline.
    Advance {
        /// Target status.
        to: LeadStatus,
        /// Optional notes recorded in the status history.
        notes: Option<String>,
    },
    /// Withdraw a lead.
    Cancel {
        /// Why the lead was cancelled.
        reason: String,
    },
    /// Hand an owned lead to a different vendor.
    Reassign {
        /// The new owner.
        vendor_id: i64,
    },
    /// Ask for the lead to be credited back to the vendor's quota.
    RequestRefund {
        /// Why the lead is unusable.
        reason: String,
    },
    /// Approve or deny a pending refund request.
    ResolveRefund {
        /// Approve (credit quota) or deny (restore prior status).
        approve: bool,
        /// Optional resolution notes.
        notes: Option<String>,
    },
}

impl Command {
    /// Returns the audit action name for the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Publish => "PublishLead",
            Self::Assign { .. } => "AssignLead",
            Self::Take { .. } => "TakeLead",
            Self::Advance { .. } => "AdvanceLead",
            Self::Cancel { .. } => "CancelLead",
            Self::Reassign { .. } => "ReassignLead",
            Self::RequestRefund { .. } => "RequestRefund",
            Self::ResolveRefund { .. } => "ResolveRefund",
        }
    }
}

/// A command against a support ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketCommand {
    /// Post a message to the ticket thread.
    Reply {
        /// Message text.
        body: String,
    },
    /// Move the ticket to a new status.
    SetStatus {
        /// Target status.
        status: TicketStatus,
    },
    /// Assign the ticket to an admin operator.
    AssignTo {
        /// The admin operator.
        operator_id: i64,
    },
}

impl TicketCommand {
    /// Returns the audit action name for the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Reply { .. } => "ReplyToTicket",
            Self::SetStatus { .. } => "SetTicketStatus",
            Self::AssignTo { .. } => "AssignTicket",
        }
    }
}
