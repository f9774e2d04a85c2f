// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod lead;
mod lead_status;
mod pagination;
mod subscription;
mod ticket;
mod validation;
mod vendor;

#[cfg(test)]
mod tests;

// Re-export public types
pub use error::DomainError;
pub use lead::{
    Lead, LeadFilter, LeadSort, LeadSource, LeadUpdate, NewLead, REFUND_WINDOW_DAYS,
    ServiceCategory,
};
pub use lead_status::{ALL_LEAD_STATUSES, LeadStatus};
pub use pagination::{DEFAULT_PER_PAGE, MAX_PER_PAGE, Page, PageRequest};
pub use subscription::{
    MAX_PLAN_DURATION_DAYS, Subscription, SubscriptionPlan, SubscriptionStatus,
    ensure_can_purchase,
};
pub use ticket::{
    SupportTicket, TicketCategory, TicketMessage, TicketParty, TicketPriority, TicketStatus,
};
pub use validation::{
    MIN_REFUND_REASON_LEN, normalize_email, normalize_phone, validate_business_name,
    validate_customer_name, validate_description, validate_location, validate_message_body,
    validate_notes, validate_reason, validate_refund_reason, validate_subject,
};
pub use vendor::{Vendor, VendorProfileUpdate};
