// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request handlers.
//!
//! Every handler takes the persistence layer, the request, the
//! authenticated actor (when the route needs one), the request cause and
//! the request time. Handlers authorize first, then validate, then hand
//! the command to core and persist the resulting transition.

pub mod leads;
pub mod public;
pub mod session;
pub mod stats;
pub mod subscriptions;
pub mod tickets;
pub mod vendor_leads;
pub mod vendors;

use leadhub_audit::{Action, AuditEvent, AuditSubject, Cause, StateSnapshot};
use leadhub_domain::{
    Lead, PageRequest, SubscriptionPlan, SupportTicket, Vendor,
};
use leadhub_persistence::SqlitePersistence;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::auth::AuthenticatedActor;
use crate::error::ApiError;

pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::new(page, per_page)?)
}

/// Parses a `YYYY-MM-DD` date from a request field.
pub(crate) fn parse_date(field: &str, raw: &str) -> Result<Date, ApiError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|e| {
        ApiError::InvalidInput {
            field: field.to_string(),
            message: format!("'{raw}' is not a YYYY-MM-DD date: {e}"),
        }
    })
}

pub(crate) fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<Date>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(field, value).map(Some),
    }
}

pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<OffsetDateTime, ApiError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|e| ApiError::InvalidInput {
        field: field.to_string(),
        message: format!("'{raw}' is not an RFC 3339 timestamp: {e}"),
    })
}

pub(crate) fn load_lead(persistence: &mut SqlitePersistence, lead_id: i64) -> Result<Lead, ApiError> {
    persistence
        .get_lead(lead_id)?
        .ok_or_else(|| ApiError::not_found("Lead", format!("Lead {lead_id} does not exist")))
}

pub(crate) fn load_vendor(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
) -> Result<Vendor, ApiError> {
    persistence.get_vendor(vendor_id)?.ok_or_else(|| {
        ApiError::not_found("Vendor", format!("Vendor {vendor_id} does not exist"))
    })
}

pub(crate) fn load_plan(
    persistence: &mut SqlitePersistence,
    plan_id: i64,
) -> Result<SubscriptionPlan, ApiError> {
    persistence
        .get_plan(plan_id)?
        .ok_or_else(|| ApiError::not_found("Plan", format!("Plan {plan_id} does not exist")))
}

pub(crate) fn load_ticket(
    persistence: &mut SqlitePersistence,
    ticket_id: i64,
) -> Result<SupportTicket, ApiError> {
    persistence.get_ticket(ticket_id)?.ok_or_else(|| {
        ApiError::not_found("Ticket", format!("Ticket {ticket_id} does not exist"))
    })
}

/// Builds an audit event attributed to the operator.
pub(crate) fn operator_event(
    actor: &AuthenticatedActor,
    cause: Cause,
    action: &str,
    details: String,
    before: StateSnapshot,
    after: StateSnapshot,
    subject: AuditSubject,
) -> AuditEvent {
    AuditEvent::new(
        actor.to_audit_actor(),
        cause,
        Action::new(action.to_string(), Some(details)),
        before,
        after,
        subject,
    )
}

pub(crate) fn snapshot(data: impl Into<String>) -> StateSnapshot {
    StateSnapshot::new(data.into())
}

pub(crate) fn vendor_snapshot(vendor: &Vendor) -> StateSnapshot {
    let categories: Vec<&str> = vendor.categories.iter().map(|c| c.as_str()).collect();
    StateSnapshot::new(format!(
        "business_name={},email={},phone={},categories=[{}],areas={},active={}",
        vendor.business_name,
        vendor.contact_email,
        vendor.phone,
        categories.join(","),
        vendor.service_areas,
        vendor.is_active
    ))
}
