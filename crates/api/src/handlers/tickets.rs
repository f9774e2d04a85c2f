// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Support ticket handlers.

use leadhub::{NewTicket, TicketCommand, TicketTransition, apply_ticket, open_ticket as open_transition};
use leadhub_audit::Cause;
use leadhub_domain::{
    DomainError, Lead, Page, SupportTicket, TicketCategory, TicketPriority, TicketStatus,
};
use leadhub_persistence::{OperatorData, SqlitePersistence, TicketFilter};
use time::OffsetDateTime;
use tracing::info;

use super::{load_lead, load_ticket, page_request};
use crate::auth::{AuthenticatedActor, AuthorizationService, Role};
use crate::error::ApiError;
use crate::request_response::{
    AssignTicketRequest, ListTicketsQuery, OpenTicketRequest, ReplyTicketRequest,
    SetTicketStatusRequest, TicketDetailResponse, TicketInfo, TicketMessageInfo, TicketResponse,
};

fn ensure_can_view(actor: &AuthenticatedActor, ticket: &SupportTicket) -> Result<(), ApiError> {
    match (actor.role, actor.vendor_id) {
        (Role::Admin, _) => Ok(()),
        (Role::Vendor, Some(vendor_id)) if vendor_id == ticket.vendor_id => Ok(()),
        _ => Err(ApiError::Forbidden {
            action: String::from("view ticket"),
            reason: format!("Ticket {} belongs to another vendor", ticket.id_or_zero()),
        }),
    }
}

fn detail(
    persistence: &mut SqlitePersistence,
    ticket: &SupportTicket,
) -> Result<TicketDetailResponse, ApiError> {
    let messages: Vec<TicketMessageInfo> = persistence
        .list_ticket_messages(ticket.id_or_zero())?
        .iter()
        .map(TicketMessageInfo::from)
        .collect();
    Ok(TicketDetailResponse {
        ticket: TicketInfo::from(ticket),
        messages,
    })
}

/// Opens a ticket with its first message. A referenced lead must be one
/// the vendor owns.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator, a field is
/// invalid, or the lead is not the vendor's.
pub fn open_ticket(
    persistence: &mut SqlitePersistence,
    request: &OpenTicketRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketDetailResponse, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "open ticket")?;

    if let Some(lead_id) = request.lead_id {
        let lead: Lead = load_lead(persistence, lead_id)?;
        if !lead.is_owned_by(vendor_id) {
            return Err(DomainError::NotLeadOwner { lead_id, vendor_id }.into());
        }
    }

    let input: NewTicket = NewTicket {
        subject: request.subject.clone(),
        category: request.category.trim().parse::<TicketCategory>()?,
        priority: request
            .priority
            .as_deref()
            .map(|p| p.trim().parse::<TicketPriority>())
            .transpose()?
            .unwrap_or(TicketPriority::Medium),
        lead_id: request.lead_id,
        body: request.body.clone(),
    };
    let transition: TicketTransition = open_transition(
        &input,
        actor.authority(),
        actor.to_audit_actor(),
        cause,
        now,
    )?;
    let (ticket_id, _event_id) = persistence.insert_ticket(&transition)?;

    info!(ticket_id, vendor_id, "Ticket opened");
    let ticket: SupportTicket = load_ticket(persistence, ticket_id)?;
    detail(persistence, &ticket)
}

/// Admins see every ticket; vendors only their own.
///
/// # Errors
///
/// Returns an error if a status or priority filter is unknown.
pub fn list_tickets(
    persistence: &mut SqlitePersistence,
    query: &ListTicketsQuery,
    actor: &AuthenticatedActor,
) -> Result<Page<TicketInfo>, ApiError> {
    let vendor_id: Option<i64> = match actor.role {
        Role::Admin => query.vendor_id,
        Role::Vendor => Some(AuthorizationService::require_vendor(actor, "list tickets")?),
    };
    let filter: TicketFilter = TicketFilter {
        vendor_id,
        status: query
            .status
            .as_deref()
            .map(|s| s.trim().parse::<TicketStatus>().map(|s| s.as_str().to_string()))
            .transpose()?,
        priority: query
            .priority
            .as_deref()
            .map(|p| p.trim().parse::<TicketPriority>().map(|p| p.as_str().to_string()))
            .transpose()?,
        assigned_to: query.assigned_to,
    };
    let page: Page<SupportTicket> =
        persistence.list_tickets(&filter, page_request(query.page, query.per_page)?)?;
    Ok(page.map(|ticket| TicketInfo::from(&ticket)))
}

/// A ticket with its message thread, oldest message first.
///
/// # Errors
///
/// Returns an error if the ticket does not exist or belongs to another
/// vendor.
pub fn get_ticket(
    persistence: &mut SqlitePersistence,
    ticket_id: i64,
    actor: &AuthenticatedActor,
) -> Result<TicketDetailResponse, ApiError> {
    let ticket: SupportTicket = load_ticket(persistence, ticket_id)?;
    ensure_can_view(actor, &ticket)?;
    detail(persistence, &ticket)
}

fn run_ticket_command(
    persistence: &mut SqlitePersistence,
    ticket_id: i64,
    command: TicketCommand,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketResponse, ApiError> {
    let ticket: SupportTicket = load_ticket(persistence, ticket_id)?;
    let action: &'static str = command.name();
    let transition: TicketTransition = apply_ticket(
        &ticket,
        command,
        actor.authority(),
        actor.to_audit_actor(),
        cause,
        now,
    )?;
    let event_id: i64 = persistence.persist_ticket_transition(&transition)?;

    info!(
        ticket_id,
        action,
        from = ticket.status.as_str(),
        to = transition.new_ticket.status.as_str(),
        operator_id = actor.operator_id,
        "Ticket updated"
    );
    Ok(TicketResponse {
        ticket: TicketInfo::from(&transition.new_ticket),
        event_id,
    })
}

/// Adds a message. Replies move the ticket toward whoever must answer next.
///
/// # Errors
///
/// Returns an error if the ticket is closed, belongs to another vendor, or
/// the body is empty.
pub fn reply_ticket(
    persistence: &mut SqlitePersistence,
    ticket_id: i64,
    request: &ReplyTicketRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketResponse, ApiError> {
    run_ticket_command(
        persistence,
        ticket_id,
        TicketCommand::Reply {
            body: request.body.clone(),
        },
        actor,
        cause,
        now,
    )
}

/// # Errors
///
/// Returns an error if the status is unknown or the transition is not
/// allowed for the actor.
pub fn set_ticket_status(
    persistence: &mut SqlitePersistence,
    ticket_id: i64,
    request: &SetTicketStatusRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketResponse, ApiError> {
    let status: TicketStatus = request.status.trim().parse()?;
    run_ticket_command(
        persistence,
        ticket_id,
        TicketCommand::SetStatus { status },
        actor,
        cause,
        now,
    )
}

/// Hands a ticket to an admin operator.
///
/// # Errors
///
/// Returns an error if the actor or the assignee is not an admin.
pub fn assign_ticket(
    persistence: &mut SqlitePersistence,
    ticket_id: i64,
    request: &AssignTicketRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketResponse, ApiError> {
    AuthorizationService::require_admin(actor, "assign ticket")?;
    let assignee: OperatorData = persistence
        .get_operator_by_id(request.operator_id)?
        .ok_or_else(|| {
            ApiError::not_found("Operator", format!("Operator {} does not exist", request.operator_id))
        })?;
    if assignee.role != Role::Admin.as_str() || assignee.is_disabled {
        return Err(ApiError::invalid_input(
            "operator_id",
            format!("Operator {} is not an active admin", request.operator_id),
        ));
    }
    run_ticket_command(
        persistence,
        ticket_id,
        TicketCommand::AssignTo {
            operator_id: request.operator_id,
        },
        actor,
        cause,
        now,
    )
}

/// # Errors
///
/// Returns an error if the ticket is already closed or belongs to another
/// vendor.
pub fn close_ticket(
    persistence: &mut SqlitePersistence,
    ticket_id: i64,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketResponse, ApiError> {
    run_ticket_command(
        persistence,
        ticket_id,
        TicketCommand::SetStatus {
            status: TicketStatus::Closed,
        },
        actor,
        cause,
        now,
    )
}
