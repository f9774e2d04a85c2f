// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the `LeadHub` marketplace.
//!
//! Handlers here are transport-agnostic: they take a persistence handle,
//! an authenticated actor and a request DTO, enforce authorization, run
//! the core transition and persist it. The HTTP server wraps them.

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

mod auth;
mod csv_import;
mod error;
mod handlers;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
pub use csv_import::{import_csv_leads, preview_csv_leads};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::leads::{
    advance_lead, assign_lead, cancel_lead, create_lead, delete_lead, get_lead, lead_audit_trail,
    list_leads, publish_lead, reassign_lead, recent_audit_events, resolve_refund, update_lead,
};
pub use handlers::public::{list_public_plans, submit_lead};
pub use handlers::session::{bootstrap_admin, change_password, login, logout, whoami};
pub use handlers::stats::{dashboard, my_pipeline};
pub use handlers::subscriptions::{
    cancel_subscription, create_plan, grant_subscription, list_all_plans, my_subscriptions,
    purchase_plan, update_plan, vendor_subscriptions,
};
pub use handlers::tickets::{
    assign_ticket, close_ticket, get_ticket, list_tickets, open_ticket, reply_ticket,
    set_ticket_status,
};
pub use handlers::vendor_leads::{
    add_note, list_available_leads, list_my_leads, request_refund, take_lead,
};
pub use handlers::vendors::{
    create_vendor, get_my_profile, get_vendor, list_vendors, set_vendor_active, update_my_profile,
    update_vendor,
};
pub use password_policy::{MAX_PASSWORD_BYTES, PasswordPolicy, PasswordPolicyError};
pub use request_response::*;
