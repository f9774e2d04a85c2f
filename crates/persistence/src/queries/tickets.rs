// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Support ticket queries.

use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use leadhub_domain::{
    Page, PageRequest, SupportTicket, TicketCategory, TicketMessage, TicketParty, TicketPriority,
    TicketStatus,
};
use num_traits::ToPrimitive;

use crate::data_models::TicketFilter;
use crate::diesel_schema::{support_tickets, ticket_messages};
use crate::error::PersistenceError;
use crate::timestamps;

#[derive(Queryable, Selectable)]
#[diesel(table_name = support_tickets)]
struct TicketRow {
    ticket_id: i64,
    vendor_id: i64,
    subject: String,
    category: String,
    priority: String,
    status: String,
    assigned_to: Option<i64>,
    lead_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TicketRow> for SupportTicket {
    type Error = PersistenceError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            ticket_id: Some(row.ticket_id),
            vendor_id: row.vendor_id,
            subject: row.subject,
            category: TicketCategory::from_str(&row.category)?,
            priority: TicketPriority::from_str(&row.priority)?,
            status: TicketStatus::from_str(&row.status)?,
            assigned_to: row.assigned_to,
            lead_id: row.lead_id,
            created_at: timestamps::decode(&row.created_at)?,
            updated_at: timestamps::decode(&row.updated_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = ticket_messages)]
struct MessageRow {
    message_id: i64,
    ticket_id: i64,
    author_operator_id: i64,
    author: String,
    body: String,
    created_at: String,
}

impl TryFrom<MessageRow> for TicketMessage {
    type Error = PersistenceError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: Some(row.message_id),
            ticket_id: row.ticket_id,
            author_operator_id: row.author_operator_id,
            author: TicketParty::from_str(&row.author)?,
            body: row.body,
            created_at: timestamps::decode(&row.created_at)?,
        })
    }
}

/// Retrieves a ticket by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn get_ticket(
    conn: &mut SqliteConnection,
    ticket_id: i64,
) -> Result<Option<SupportTicket>, PersistenceError> {
    let row: Option<TicketRow> = support_tickets::table
        .filter(support_tickets::ticket_id.eq(ticket_id))
        .select(TicketRow::as_select())
        .first(conn)
        .optional()?;
    row.map(SupportTicket::try_from).transpose()
}

fn filtered(filter: &TicketFilter) -> support_tickets::BoxedQuery<'_, Sqlite> {
    let mut query = support_tickets::table.into_boxed();
    if let Some(vendor_id) = filter.vendor_id {
        query = query.filter(support_tickets::vendor_id.eq(vendor_id));
    }
    if let Some(status) = &filter.status {
        query = query.filter(support_tickets::status.eq(status));
    }
    if let Some(priority) = &filter.priority {
        query = query.filter(support_tickets::priority.eq(priority));
    }
    if let Some(assigned_to) = filter.assigned_to {
        query = query.filter(support_tickets::assigned_to.eq(assigned_to));
    }
    query
}

/// Lists tickets matching `filter`, most recently updated first.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_tickets(
    conn: &mut SqliteConnection,
    filter: &TicketFilter,
    request: PageRequest,
) -> Result<Page<SupportTicket>, PersistenceError> {
    let total: i64 = filtered(filter).count().get_result(conn)?;
    let rows: Vec<TicketRow> = filtered(filter)
        .select(TicketRow::as_select())
        .order_by((
            support_tickets::updated_at.desc(),
            support_tickets::ticket_id.desc(),
        ))
        .limit(request.limit())
        .offset(request.offset())
        .load(conn)?;

    let items: Vec<SupportTicket> = rows
        .into_iter()
        .map(SupportTicket::try_from)
        .collect::<Result<_, _>>()?;
    Ok(Page::new(items, request, total.to_u64().unwrap_or_default()))
}

/// Returns a ticket's thread, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_ticket_messages(
    conn: &mut SqliteConnection,
    ticket_id: i64,
) -> Result<Vec<TicketMessage>, PersistenceError> {
    let rows: Vec<MessageRow> = ticket_messages::table
        .filter(ticket_messages::ticket_id.eq(ticket_id))
        .select(MessageRow::as_select())
        .order_by(ticket_messages::message_id.asc())
        .load(conn)?;
    rows.into_iter().map(TicketMessage::try_from).collect()
}
