// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lead handlers for vendor operators.

use leadhub::{Command, LeadContext};
use leadhub_audit::Cause;
use leadhub_domain::{
    DomainError, Lead, LeadFilter, LeadSort, LeadStatus, Page, Subscription, Vendor,
    validate_notes,
};
use leadhub_persistence::{LeadNoteData, SqlitePersistence};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::leads::{ensure_can_view, run_command};
use super::{load_lead, load_vendor, page_request};
use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::request_response::{
    AddNoteRequest, AvailableLeadInfo, LeadInfo, LeadNoteInfo, LeadTransitionResponse,
    ListLeadsQuery, PageQuery, RefundRequest,
};

/// Leads the vendor could take right now, with customer contact hidden.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator.
pub fn list_available_leads(
    persistence: &mut SqlitePersistence,
    query: &PageQuery,
    actor: &AuthenticatedActor,
) -> Result<Page<AvailableLeadInfo>, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "browse leads")?;
    let vendor: Vendor = load_vendor(persistence, vendor_id)?;
    let request = page_request(query.page, query.per_page)?;

    if !vendor.is_active {
        return Ok(Page::new(Vec::new(), request, 0));
    }
    let page: Page<Lead> = persistence.list_available_leads(&vendor, request)?;
    debug!(vendor_id, total = page.total, "Listed available leads");
    Ok(page.map(|lead| AvailableLeadInfo::for_vendor(&lead, vendor_id)))
}

/// Leads the vendor owns, newest first unless a sort is given.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator or a filter is
/// malformed.
pub fn list_my_leads(
    persistence: &mut SqlitePersistence,
    query: &ListLeadsQuery,
    actor: &AuthenticatedActor,
) -> Result<Page<LeadInfo>, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "list own leads")?;
    let filter: LeadFilter = LeadFilter {
        status: query
            .status
            .as_deref()
            .map(str::parse::<LeadStatus>)
            .transpose()?,
        vendor_id: Some(vendor_id),
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        sort: query
            .sort
            .as_deref()
            .map(str::parse::<LeadSort>)
            .transpose()?
            .unwrap_or_default(),
        ..LeadFilter::default()
    };
    let page: Page<Lead> =
        persistence.list_leads(&filter, page_request(query.page, query.per_page)?)?;
    Ok(page.map(|lead| LeadInfo::from(&lead)))
}

/// Claims a lead for the vendor and charges one lead to its subscription.
///
/// The claim and the charge commit together. When another vendor wins the
/// race the caller gets a conflict and is not charged.
///
/// # Errors
///
/// Returns an error if the vendor is not eligible, has no usable
/// subscription, or lost the race.
pub fn take_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "take lead")?;
    let vendor: Vendor = load_vendor(persistence, vendor_id)?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    let subscription: Option<Subscription> = persistence.get_latest_subscription(vendor_id)?;

    let mut ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now).with_vendor(&vendor);
    if let Some(subscription) = subscription.as_ref() {
        ctx = ctx.with_subscription(subscription);
    }

    run_command(
        persistence,
        &lead,
        Command::Take { vendor_id },
        &ctx,
        actor,
        cause,
    )
    .inspect_err(|e| warn!(lead_id, vendor_id, error = %e, "Take refused"))
}

/// Asks for a refund on a lead the vendor owns and paid for.
///
/// # Errors
///
/// Returns an error if the vendor does not own the lead or did not pay for
/// it, the window has closed, or the reason is too short.
pub fn request_refund(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &RefundRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_vendor(actor, "request refund")?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    let paid_with: Option<Subscription> = match lead.subscription_id {
        Some(subscription_id) => persistence.get_subscription(subscription_id)?,
        None => None,
    };

    let mut ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now);
    if let Some(subscription) = paid_with.as_ref() {
        ctx = ctx.with_subscription(subscription);
    }
    run_command(
        persistence,
        &lead,
        Command::RequestRefund {
            reason: request.reason.clone(),
        },
        &ctx,
        actor,
        cause,
    )
}

/// Adds a note to a lead. Vendors may only annotate leads they own.
///
/// # Errors
///
/// Returns an error if the lead is not visible to the actor or the note is
/// empty.
pub fn add_note(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &AddNoteRequest,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<LeadNoteInfo, ApiError> {
    let lead: Lead = load_lead(persistence, lead_id)?;
    ensure_can_view(actor, &lead)?;

    let body: String = validate_notes(Some(request.body.as_str()))?
        .ok_or_else(|| DomainError::InvalidNotes(String::from("Note cannot be empty")))?;
    let note_id: i64 =
        persistence.add_lead_note(lead_id, actor.vendor_id, actor.operator_id, &body, now)?;

    info!(lead_id, note_id, operator_id = actor.operator_id, "Note added");
    persistence
        .list_lead_notes(lead_id)?
        .into_iter()
        .find(|note: &LeadNoteData| note.note_id == note_id)
        .map(LeadNoteInfo::from)
        .ok_or_else(|| ApiError::not_found("Note", format!("Note {note_id} vanished")))
}
