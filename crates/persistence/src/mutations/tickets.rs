// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Support ticket mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use leadhub::TicketTransition;
use leadhub_audit::{AuditEvent, AuditSubject};
use leadhub_domain::{SupportTicket, TicketMessage};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{support_tickets, ticket_messages};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::timestamps;

fn insert_message(
    conn: &mut SqliteConnection,
    ticket_id: i64,
    message: &TicketMessage,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(ticket_messages::table)
        .values((
            ticket_messages::ticket_id.eq(ticket_id),
            ticket_messages::author_operator_id.eq(message.author_operator_id),
            ticket_messages::author.eq(message.author.as_str()),
            ticket_messages::body.eq(&message.body),
            ticket_messages::created_at.eq(timestamps::encode(message.created_at)?),
        ))
        .execute(conn)?;
    let message_id: i64 = conn.get_last_insert_rowid()?;
    debug!(ticket_id, message_id, "Inserted ticket message");
    Ok(message_id)
}

/// Inserts a newly opened ticket, its first message and audit event.
///
/// # Returns
///
/// `(ticket_id, event_id)`.
///
/// # Errors
///
/// Returns an error if any write fails.
pub fn insert_ticket(
    conn: &mut SqliteConnection,
    transition: &TicketTransition,
) -> Result<(i64, i64), PersistenceError> {
    let ticket: &SupportTicket = &transition.new_ticket;

    conn.immediate_transaction(|conn| {
        diesel::insert_into(support_tickets::table)
            .values((
                support_tickets::vendor_id.eq(ticket.vendor_id),
                support_tickets::subject.eq(&ticket.subject),
                support_tickets::category.eq(ticket.category.as_str()),
                support_tickets::priority.eq(ticket.priority.as_str()),
                support_tickets::status.eq(ticket.status.as_str()),
                support_tickets::assigned_to.eq(ticket.assigned_to),
                support_tickets::lead_id.eq(ticket.lead_id),
                support_tickets::created_at.eq(timestamps::encode(ticket.created_at)?),
                support_tickets::updated_at.eq(timestamps::encode(ticket.updated_at)?),
            ))
            .execute(conn)?;
        let ticket_id: i64 = conn.get_last_insert_rowid()?;

        if let Some(message) = &transition.message {
            insert_message(conn, ticket_id, message)?;
        }

        let mut event: AuditEvent = transition.audit_event.clone();
        event.subject = AuditSubject::Ticket(ticket_id);
        let event_id: i64 = persist_audit_event(conn, &event, ticket.created_at)?;

        info!(ticket_id, vendor_id = ticket.vendor_id, "Opened support ticket");
        Ok((ticket_id, event_id))
    })
}

/// Saves a ticket change, appending the reply if there is one.
///
/// # Errors
///
/// Returns an error if the ticket is unsaved or missing.
pub fn persist_ticket_transition(
    conn: &mut SqliteConnection,
    transition: &TicketTransition,
) -> Result<i64, PersistenceError> {
    let ticket: &SupportTicket = &transition.new_ticket;
    let ticket_id: i64 = ticket
        .ticket_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("Ticket has not been saved")))?;

    conn.immediate_transaction(|conn| {
        let rows_affected: usize = diesel::update(support_tickets::table)
            .filter(support_tickets::ticket_id.eq(ticket_id))
            .set((
                support_tickets::status.eq(ticket.status.as_str()),
                support_tickets::priority.eq(ticket.priority.as_str()),
                support_tickets::assigned_to.eq(ticket.assigned_to),
                support_tickets::updated_at.eq(timestamps::encode(ticket.updated_at)?),
            ))
            .execute(conn)?;
        if rows_affected == 0 {
            return Err(PersistenceError::NotFound(format!(
                "Ticket {ticket_id} not found"
            )));
        }

        if let Some(message) = &transition.message {
            insert_message(conn, ticket_id, message)?;
        }

        let event_id: i64 = persist_audit_event(conn, &transition.audit_event, ticket.updated_at)?;
        info!(ticket_id, status = ticket.status.as_str(), "Updated support ticket");
        Ok(event_id)
    })
}
