// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Customer name is empty or too long.
    InvalidCustomerName(String),
    /// Email address is malformed.
    InvalidEmail(String),
    /// Phone number is malformed.
    InvalidPhone(String),
    /// Lead description is too long.
    InvalidDescription(String),
    /// Budget must not be negative.
    InvalidBudget(i64),
    /// Service category is empty or contains invalid characters.
    InvalidCategory(String),
    /// Location is empty or too long.
    InvalidLocation(String),
    /// Lead source string is not recognized.
    InvalidLeadSource(String),
    /// Lead status string is not recognized.
    InvalidLeadStatus {
        /// The unrecognized status.
        status: String,
    },
    /// Lead sort order string is not recognized.
    InvalidLeadSort(String),
    /// A lifecycle transition is not permitted.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was rejected.
        reason: String,
    },
    /// Lead does not exist.
    LeadNotFound(i64),
    /// Lead has already been taken by a vendor.
    LeadAlreadyTaken {
        /// The lead.
        lead_id: i64,
    },
    /// Lead is not in a status that allows taking.
    LeadNotTakeable {
        /// The lead.
        lead_id: i64,
        /// The current status.
        status: String,
    },
    /// Vendor is not eligible for the lead.
    VendorNotEligible {
        /// The lead.
        lead_id: i64,
        /// The vendor.
        vendor_id: i64,
    },
    /// Vendor is not the owner of the lead.
    NotLeadOwner {
        /// The lead.
        lead_id: i64,
        /// The vendor that attempted the action.
        vendor_id: i64,
    },
    /// An assignment must name at least one vendor.
    EmptyAssignment,
    /// The refund window has closed.
    RefundWindowExpired {
        /// The lead.
        lead_id: i64,
        /// The refund window length in days.
        window_days: i64,
    },
    /// No refund is pending for the lead.
    NoRefundPending {
        /// The lead.
        lead_id: i64,
    },
    /// Notes or reasons are too short or too long.
    InvalidNotes(String),
    /// Vendor does not exist.
    VendorNotFound(i64),
    /// Vendor account is deactivated.
    VendorInactive(i64),
    /// Business name is empty or too long.
    InvalidBusinessName(String),
    /// Subscription plan field is invalid.
    InvalidPlan(String),
    /// Subscription plan does not exist.
    PlanNotFound(i64),
    /// Subscription plan is no longer offered.
    PlanInactive(i64),
    /// Subscription status string is not recognized.
    InvalidSubscriptionStatus(String),
    /// Subscription does not exist.
    SubscriptionNotFound(i64),
    /// Vendor has no active subscription.
    NoActiveSubscription {
        /// The vendor.
        vendor_id: i64,
    },
    /// Vendor's active subscription has no remaining leads.
    QuotaExhausted {
        /// The vendor.
        vendor_id: i64,
    },
    /// Vendor already holds an active subscription with remaining quota.
    ActiveSubscriptionExists {
        /// The vendor.
        vendor_id: i64,
        /// The active subscription.
        subscription_id: i64,
    },
    /// Ticket status string is not recognized.
    InvalidTicketStatus(String),
    /// Ticket priority string is not recognized.
    InvalidTicketPriority(String),
    /// Ticket category string is not recognized.
    InvalidTicketCategory(String),
    /// A ticket status transition is not permitted.
    InvalidTicketTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },
    /// Ticket subject is too short or too long.
    InvalidSubject(String),
    /// Ticket message body is empty or too long.
    InvalidMessageBody(String),
    /// Ticket does not exist.
    TicketNotFound(i64),
    /// Ticket is closed and accepts no further changes.
    TicketClosed(i64),
    /// Page number must be at least 1.
    InvalidPage {
        /// The invalid page.
        page: u32,
    },
    /// Page size is out of range.
    InvalidPageSize {
        /// The invalid page size.
        per_page: u32,
    },
    /// Failed to parse a date or timestamp.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
}

impl std::fmt::Display for DomainError {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCustomerName(msg) => write!(f, "Invalid customer name: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidPhone(msg) => write!(f, "Invalid phone: {msg}"),
            Self::InvalidDescription(msg) => write!(f, "Invalid description: {msg}"),
            Self::InvalidBudget(value) => {
                write!(f, "Invalid budget: {value}. Must not be negative")
            }
            Self::InvalidCategory(msg) => write!(f, "Invalid service category: {msg}"),
            Self::InvalidLocation(msg) => write!(f, "Invalid location: {msg}"),
            Self::InvalidLeadSource(source) => write!(f, "Invalid lead source: '{source}'"),
            Self::InvalidLeadStatus { status } => write!(f, "Invalid lead status: '{status}'"),
            Self::InvalidLeadSort(sort) => write!(f, "Invalid lead sort order: '{sort}'"),
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition lead from '{from}' to '{to}': {reason}")
            }
            Self::LeadNotFound(id) => write!(f, "Lead {id} not found"),
            Self::LeadAlreadyTaken { lead_id } => {
                write!(f, "Lead {lead_id} has already been taken by another vendor")
            }
            Self::LeadNotTakeable { lead_id, status } => {
                write!(f, "Lead {lead_id} cannot be taken while '{status}'")
            }
            Self::VendorNotEligible { lead_id, vendor_id } => {
                write!(f, "Vendor {vendor_id} is not eligible for lead {lead_id}")
            }
            Self::NotLeadOwner { lead_id, vendor_id } => {
                write!(f, "Vendor {vendor_id} does not own lead {lead_id}")
            }
            Self::EmptyAssignment => write!(f, "Assignment must name at least one vendor"),
            Self::RefundWindowExpired {
                lead_id,
                window_days,
            } => {
                write!(
                    f,
                    "Refund window for lead {lead_id} closed {window_days} days after it was taken"
                )
            }
            Self::NoRefundPending { lead_id } => {
                write!(f, "No refund request is pending for lead {lead_id}")
            }
            Self::InvalidNotes(msg) => write!(f, "Invalid notes: {msg}"),
            Self::VendorNotFound(id) => write!(f, "Vendor {id} not found"),
            Self::VendorInactive(id) => write!(f, "Vendor {id} is inactive"),
            Self::InvalidBusinessName(msg) => write!(f, "Invalid business name: {msg}"),
            Self::InvalidPlan(msg) => write!(f, "Invalid subscription plan: {msg}"),
            Self::PlanNotFound(id) => write!(f, "Subscription plan {id} not found"),
            Self::PlanInactive(id) => write!(f, "Subscription plan {id} is no longer offered"),
            Self::InvalidSubscriptionStatus(status) => {
                write!(f, "Invalid subscription status: '{status}'")
            }
            Self::SubscriptionNotFound(id) => write!(f, "Subscription {id} not found"),
            Self::NoActiveSubscription { vendor_id } => {
                write!(f, "Vendor {vendor_id} has no active subscription")
            }
            Self::QuotaExhausted { vendor_id } => {
                write!(f, "Vendor {vendor_id} has no leads remaining in the current subscription")
            }
            Self::ActiveSubscriptionExists {
                vendor_id,
                subscription_id,
            } => {
                write!(
                    f,
                    "Vendor {vendor_id} already has active subscription {subscription_id} with remaining leads"
                )
            }
            Self::InvalidTicketStatus(status) => write!(f, "Invalid ticket status: '{status}'"),
            Self::InvalidTicketPriority(priority) => {
                write!(f, "Invalid ticket priority: '{priority}'")
            }
            Self::InvalidTicketCategory(category) => {
                write!(f, "Invalid ticket category: '{category}'")
            }
            Self::InvalidTicketTransition { from, to } => {
                write!(f, "Cannot transition ticket from '{from}' to '{to}'")
            }
            Self::InvalidSubject(msg) => write!(f, "Invalid subject: {msg}"),
            Self::InvalidMessageBody(msg) => write!(f, "Invalid message: {msg}"),
            Self::TicketNotFound(id) => write!(f, "Ticket {id} not found"),
            Self::TicketClosed(id) => write!(f, "Ticket {id} is closed"),
            Self::InvalidPage { page } => {
                write!(f, "Invalid page: {page}. Pages start at 1")
            }
            Self::InvalidPageSize { per_page } => {
                write!(f, "Invalid page size: {per_page}. Must be between 1 and 100")
            }
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
