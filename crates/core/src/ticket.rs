// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Support ticket commands.

use crate::command::TicketCommand;
use crate::error::CoreError;
use crate::state::{Authority, TicketTransition, ticket_snapshot};
use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use leadhub_domain::{
    DomainError, SupportTicket, TicketCategory, TicketMessage, TicketParty, TicketPriority,
    TicketStatus,
};
use time::OffsetDateTime;

/// A vendor's request to open a ticket, with its first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub subject: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub lead_id: Option<i64>,
    pub body: String,
}

/// Opens a ticket for the acting vendor.
///
/// The returned ticket and message are unsaved; persistence assigns the
/// ticket id and fills it into the message and audit subject.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator or the subject or
/// body is invalid.
pub fn open_ticket(
    input: &NewTicket,
    authority: Authority,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketTransition, CoreError> {
    let Authority::Vendor {
        operator_id,
        vendor_id,
    } = authority
    else {
        return Err(CoreError::forbidden(
            "open ticket",
            "tickets are opened by vendor operators",
        ));
    };

    let ticket: SupportTicket = SupportTicket::open(
        vendor_id,
        &input.subject,
        input.category,
        input.priority,
        input.lead_id,
        now,
    )?;
    let message: TicketMessage =
        TicketMessage::new(0, operator_id, TicketParty::Vendor, &input.body, now)?;

    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(
            String::from("OpenTicket"),
            Some(format!(
                "Vendor {vendor_id} opened a {} ticket: {}",
                ticket.category.as_str(),
                ticket.subject
            )),
        ),
        StateSnapshot::new(String::from("none")),
        ticket_snapshot(&ticket),
        AuditSubject::Ticket(0),
    );

    Ok(TicketTransition {
        new_ticket: ticket,
        message: Some(message),
        audit_event,
    })
}

/// Applies a command to a ticket.
///
/// # Errors
///
/// Returns an error if:
/// - The ticket is closed
/// - A vendor acts on a ticket it does not own, or issues an admin-only
///   command
/// - The status transition is not allowed
/// - A reply body is invalid
pub fn apply_ticket(
    ticket: &SupportTicket,
    command: TicketCommand,
    authority: Authority,
    actor: Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TicketTransition, CoreError> {
    let ticket_id: i64 = ticket.id_or_zero();
    let action_name: &'static str = command.name();

    if ticket.status == TicketStatus::Closed {
        return Err(DomainError::TicketClosed(ticket_id).into());
    }
    let party: TicketParty = match authority {
        Authority::Admin { .. } | Authority::System => TicketParty::Admin,
        Authority::Vendor { vendor_id, .. } if vendor_id == ticket.vendor_id => {
            TicketParty::Vendor
        }
        Authority::Vendor { .. } => {
            return Err(CoreError::forbidden(
                action_name,
                format!("ticket {ticket_id} belongs to another vendor"),
            ));
        }
    };

    let mut next: SupportTicket = ticket.clone();
    next.updated_at = now;
    let mut message: Option<TicketMessage> = None;

    let details: String = match command {
        TicketCommand::Reply { body } => {
            message = Some(TicketMessage::new(
                ticket_id,
                authority.operator_id(),
                party,
                &body,
                now,
            )?);
            next.status = ticket.status.after_reply(party);
            format!(
                "{} replied to ticket {ticket_id}",
                if party == TicketParty::Admin {
                    "Staff"
                } else {
                    "Vendor"
                }
            )
        }
        TicketCommand::SetStatus { status } => {
            if party == TicketParty::Vendor
                && !matches!(status, TicketStatus::Closed | TicketStatus::Open)
            {
                return Err(CoreError::forbidden(
                    action_name,
                    "vendors may only close or reopen their tickets",
                ));
            }
            ticket.status.validate_transition(status)?;
            next.status = status;
            format!(
                "Ticket {ticket_id} moved from '{}' to '{}'",
                ticket.status.as_str(),
                status.as_str()
            )
        }
        TicketCommand::AssignTo { operator_id } => {
            if party != TicketParty::Admin {
                return Err(CoreError::forbidden(
                    action_name,
                    "administrator role required",
                ));
            }
            next.assigned_to = Some(operator_id);
            if ticket.status == TicketStatus::Open {
                next.status = TicketStatus::InProgress;
            }
            format!("Ticket {ticket_id} assigned to operator {operator_id}")
        }
    };

    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(String::from(action_name), Some(details)),
        ticket_snapshot(ticket),
        ticket_snapshot(&next),
        AuditSubject::Ticket(ticket_id),
    );

    Ok(TicketTransition {
        new_ticket: next,
        message,
        audit_event,
    })
}
