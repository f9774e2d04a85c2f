// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lead administration and the lifecycle commands shared by both roles.

use leadhub::{Command, LeadContext, LeadTransition, apply, lead_snapshot};
use leadhub_audit::{AuditEvent, AuditSubject, Cause};
use leadhub_domain::{
    Lead, LeadFilter, LeadSort, LeadSource, LeadStatus, LeadUpdate, NewLead, Page,
    ServiceCategory, Vendor,
};
use leadhub_persistence::SqlitePersistence;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::{
    load_lead, load_vendor, operator_event, page_request, parse_optional_date, parse_timestamp,
    snapshot,
};
use crate::auth::{AuthenticatedActor, AuthorizationService, Role};
use crate::error::ApiError;
use crate::request_response::{
    AdvanceLeadRequest, AssignLeadRequest, AuditEventInfo, AuditQuery, CancelLeadRequest,
    EventResponse, LeadDetailResponse, LeadInfo, LeadTransitionResponse, ListLeadsQuery,
    ReassignLeadRequest, ResolveRefundRequest, SubmitLeadRequest, UpdateLeadRequest,
};

/// Most audit rows returned by one listing.
const MAX_AUDIT_LIMIT: i64 = 500;

/// Applies a lifecycle command and persists the transition.
///
/// Takes go through the compare-and-set path so that losing a race
/// surfaces as a conflict.
pub(crate) fn run_command(
    persistence: &mut SqlitePersistence,
    lead: &Lead,
    command: Command,
    ctx: &LeadContext<'_>,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<LeadTransitionResponse, ApiError> {
    let is_take: bool = matches!(command, Command::Take { .. });
    let action: &'static str = command.name();
    let transition: LeadTransition = apply(lead, command, ctx, actor.to_audit_actor(), cause)?;

    let event_id: i64 = if is_take {
        persistence.take_lead(&transition)?
    } else {
        persistence.persist_lead_transition(&transition)?
    };

    let lead_id: i64 = lead.id_or_zero();
    let status: &str = transition.new_lead.status.as_str();
    info!(
        lead_id,
        action,
        from = lead.status.as_str(),
        to = status,
        operator_id = actor.operator_id,
        "Lead transition applied"
    );

    let mut info: LeadInfo = LeadInfo::from(&transition.new_lead);
    info.lead_id = lead_id;
    Ok(LeadTransitionResponse {
        lead: info,
        event_id,
        message: format!("Lead {lead_id} is now {status}"),
    })
}

/// Lets admins and the owning vendor see a lead in full.
pub(crate) fn ensure_can_view(actor: &AuthenticatedActor, lead: &Lead) -> Result<(), ApiError> {
    match (actor.role, actor.vendor_id) {
        (Role::Admin, _) => Ok(()),
        (Role::Vendor, Some(vendor_id)) if lead.is_owned_by(vendor_id) => Ok(()),
        _ => Err(ApiError::Forbidden {
            action: String::from("view lead"),
            reason: format!("Lead {} is not yours", lead.id_or_zero()),
        }),
    }
}

/// Enters a lead on a customer's behalf (phone or walk-in).
///
/// # Errors
///
/// Returns an error if the actor is not an admin or validation fails.
pub fn create_lead(
    persistence: &mut SqlitePersistence,
    request: &SubmitLeadRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "create lead")?;

    let input: NewLead = NewLead {
        customer_name: request.customer_name.clone(),
        customer_email: request.customer_email.clone(),
        customer_phone: request.customer_phone.clone(),
        category: request.category.clone(),
        location: request.location.clone(),
        description: request.description.clone(),
        budget_cents: request.budget_cents,
        preferred_date: parse_optional_date("preferred_date", request.preferred_date.as_deref())?,
    };
    let mut lead: Lead = Lead::submit(&input, LeadSource::Admin, now)?;

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "CreateLead",
        format!("Admin entered a '{}' lead", lead.category),
        snapshot("none"),
        lead_snapshot(&lead),
        AuditSubject::Lead(0),
    );
    let (lead_id, event_id) =
        persistence.insert_lead(&lead, &event, Some(actor.operator_id))?;
    lead.lead_id = Some(lead_id);

    info!(lead_id, operator_id = actor.operator_id, "Lead created by admin");
    Ok(LeadTransitionResponse {
        lead: LeadInfo::from(&lead),
        event_id,
        message: format!("Lead {lead_id} created"),
    })
}

/// # Errors
///
/// Returns an error if the actor is not an admin or a filter is malformed.
pub fn list_leads(
    persistence: &mut SqlitePersistence,
    query: &ListLeadsQuery,
    actor: &AuthenticatedActor,
) -> Result<Page<LeadInfo>, ApiError> {
    AuthorizationService::require_admin(actor, "list leads")?;

    let filter: LeadFilter = LeadFilter {
        status: query
            .status
            .as_deref()
            .map(str::parse::<LeadStatus>)
            .transpose()?,
        category: query
            .category
            .as_deref()
            .map(ServiceCategory::new)
            .transpose()?,
        vendor_id: query.vendor_id,
        search: query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string),
        created_after: query
            .created_after
            .as_deref()
            .map(|raw| parse_timestamp("created_after", raw))
            .transpose()?,
        created_before: query
            .created_before
            .as_deref()
            .map(|raw| parse_timestamp("created_before", raw))
            .transpose()?,
        sort: query
            .sort
            .as_deref()
            .map(str::parse::<LeadSort>)
            .transpose()?
            .unwrap_or_default(),
    };

    let page: Page<Lead> =
        persistence.list_leads(&filter, page_request(query.page, query.per_page)?)?;
    debug!(total = page.total, "Listed leads");
    Ok(page.map(|lead| LeadInfo::from(&lead)))
}

/// A lead with its history and notes.
///
/// # Errors
///
/// Returns an error if the lead does not exist or belongs to another vendor.
pub fn get_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    actor: &AuthenticatedActor,
) -> Result<LeadDetailResponse, ApiError> {
    let lead: Lead = load_lead(persistence, lead_id)?;
    ensure_can_view(actor, &lead)?;

    let history = persistence
        .get_lead_history(lead_id)?
        .into_iter()
        .map(Into::into)
        .collect();
    let notes = persistence
        .list_lead_notes(lead_id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(LeadDetailResponse {
        lead: LeadInfo::from(&lead),
        history,
        notes,
    })
}

/// Corrects customer details. The lifecycle is untouched.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the lead does not exist
/// or a field is invalid.
pub fn update_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &UpdateLeadRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "update lead")?;
    let lead: Lead = load_lead(persistence, lead_id)?;

    let update: LeadUpdate = LeadUpdate {
        customer_name: request.customer_name.clone(),
        customer_email: request.customer_email.clone(),
        customer_phone: request.customer_phone.clone(),
        category: request.category.clone(),
        location: request.location.clone(),
        description: request.description.clone(),
        budget_cents: if request.clear_budget {
            Some(None)
        } else {
            request.budget_cents.map(Some)
        },
        preferred_date: if request.clear_preferred_date {
            Some(None)
        } else {
            parse_optional_date("preferred_date", request.preferred_date.as_deref())?.map(Some)
        },
    };
    let updated: Lead = lead.with_update(update, now)?;

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "UpdateLead",
        format!("Edited details of lead {lead_id}"),
        lead_snapshot(&lead),
        lead_snapshot(&updated),
        AuditSubject::Lead(lead_id),
    );
    let event_id: i64 = persistence.persist_lead_update(&updated, &event)?;

    info!(lead_id, operator_id = actor.operator_id, "Lead details updated");
    Ok(LeadTransitionResponse {
        lead: LeadInfo::from(&updated),
        event_id,
        message: format!("Lead {lead_id} updated"),
    })
}

/// Deletes a lead nobody has taken. The audit trail is kept.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the lead does not exist
/// or it has been taken.
pub fn delete_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<EventResponse, ApiError> {
    AuthorizationService::require_admin(actor, "delete lead")?;
    let lead: Lead = load_lead(persistence, lead_id)?;

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "DeleteLead",
        format!("Deleted lead {lead_id} ({})", lead.status.as_str()),
        lead_snapshot(&lead),
        snapshot("deleted"),
        AuditSubject::Lead(lead_id),
    );
    let event_id: i64 = persistence.delete_lead(lead_id, &event, now)?;

    info!(lead_id, operator_id = actor.operator_id, "Lead deleted");
    Ok(EventResponse {
        event_id,
        message: format!("Lead {lead_id} deleted"),
    })
}

/// Opens a pending lead to every eligible vendor.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the lead cannot be
/// published from its current status.
pub fn publish_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "publish lead")?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    let ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now);
    run_command(persistence, &lead, Command::Publish, &ctx, actor, cause)
}

/// Restricts a lead to the listed vendors.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, a vendor does not exist
/// or the lead cannot be assigned from its current status.
pub fn assign_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &AssignLeadRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "assign lead")?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    for vendor_id in &request.vendor_ids {
        let vendor: Vendor = load_vendor(persistence, *vendor_id)?;
        if !vendor.is_active {
            return Err(leadhub_domain::DomainError::VendorInactive(*vendor_id).into());
        }
    }

    let ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now);
    run_command(
        persistence,
        &lead,
        Command::Assign {
            vendor_ids: request.vendor_ids.clone(),
        },
        &ctx,
        actor,
        cause,
    )
}

/// Moves a taken lead to another vendor. Quota stays with the original
/// subscription.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the vendor does not
/// exist or is inactive, or the lead is not owned.
pub fn reassign_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &ReassignLeadRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "reassign lead")?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    let vendor: Vendor = load_vendor(persistence, request.vendor_id)?;

    let ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now).with_vendor(&vendor);
    run_command(
        persistence,
        &lead,
        Command::Reassign {
            vendor_id: request.vendor_id,
        },
        &ctx,
        actor,
        cause,
    )
}

/// # Errors
///
/// Returns an error if the actor is not an admin or the lead is already
/// closed.
pub fn cancel_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &CancelLeadRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "cancel lead")?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    let ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now);
    run_command(
        persistence,
        &lead,
        Command::Cancel {
            reason: request.reason.clone(),
        },
        &ctx,
        actor,
        cause,
    )
}

/// Moves a lead along the pipeline. Vendors may only move leads they own.
///
/// # Errors
///
/// Returns an error if the status is unknown, the transition is not
/// allowed or the vendor does not own the lead.
pub fn advance_lead(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &AdvanceLeadRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    let to: LeadStatus = request.status.trim().parse()?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    let ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now);
    run_command(
        persistence,
        &lead,
        Command::Advance {
            to,
            notes: request.notes.clone(),
        },
        &ctx,
        actor,
        cause,
    )
}

/// Approves or denies a refund request. Approval credits one lead back to
/// the subscription that paid for it.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or no refund is pending.
pub fn resolve_refund(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    request: &ResolveRefundRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<LeadTransitionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "resolve refund")?;
    let lead: Lead = load_lead(persistence, lead_id)?;
    let ctx: LeadContext<'_> = LeadContext::new(actor.authority(), now);
    run_command(
        persistence,
        &lead,
        Command::ResolveRefund {
            approve: request.approve,
            notes: request.notes.clone(),
        },
        &ctx,
        actor,
        cause,
    )
}

/// Audit events recorded against one lead, oldest first.
///
/// # Errors
///
/// Returns an error if the actor is not an admin.
pub fn lead_audit_trail(
    persistence: &mut SqlitePersistence,
    lead_id: i64,
    actor: &AuthenticatedActor,
) -> Result<Vec<AuditEventInfo>, ApiError> {
    AuthorizationService::require_admin(actor, "view audit trail")?;
    Ok(persistence
        .list_audit_events_for_subject(AuditSubject::Lead(lead_id))?
        .into_iter()
        .map(AuditEventInfo::from)
        .collect())
}

/// The most recent audit events across the marketplace.
///
/// # Errors
///
/// Returns an error if the actor is not an admin.
pub fn recent_audit_events(
    persistence: &mut SqlitePersistence,
    query: &AuditQuery,
    actor: &AuthenticatedActor,
) -> Result<Vec<AuditEventInfo>, ApiError> {
    AuthorizationService::require_admin(actor, "view audit trail")?;
    let limit: i64 = query.limit.unwrap_or(50).clamp(1, MAX_AUDIT_LIMIT);
    Ok(persistence
        .list_recent_audit_events(limit)?
        .into_iter()
        .map(AuditEventInfo::from)
        .collect())
}
