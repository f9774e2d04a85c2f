// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Support tickets. One set of routes serves both roles; the API layer
//! scopes vendors to their own tickets.

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
};
use leadhub_api::{
    AssignTicketRequest, ListTicketsQuery, OpenTicketRequest, ReplyTicketRequest,
    SetTicketStatusRequest, TicketDetailResponse, TicketInfo, TicketResponse, assign_ticket,
    close_ticket, get_ticket, list_tickets, open_ticket, reply_ticket, set_ticket_status,
};
use leadhub_domain::Page;
use time::OffsetDateTime;
use tracing::info;

use crate::{AppState, HttpError, live::LiveEvent, session::SessionOperator};

/// GET `/api/tickets`
pub async fn handle_list_tickets(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<Page<TicketInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_tickets(&mut persistence, &query, &actor)?))
}

/// POST `/api/tickets`
pub async fn handle_open_ticket(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<OpenTicketRequest>,
) -> Result<Json<TicketDetailResponse>, HttpError> {
    info!(vendor_id = ?actor.vendor_id, category = %req.category, "Handling open_ticket request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TicketDetailResponse = open_ticket(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("Open ticket"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::TicketOpened {
        ticket_id: response.ticket.ticket_id,
        vendor_id: response.ticket.vendor_id,
    });
    Ok(Json(response))
}

/// GET `/api/tickets/{ticket_id}`: the ticket with its whole thread.
pub async fn handle_get_ticket(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(ticket_id): Path<i64>,
) -> Result<Json<TicketDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(get_ticket(&mut persistence, ticket_id, &actor)?))
}

/// POST `/api/tickets/{ticket_id}/reply`
pub async fn handle_reply_ticket(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(ticket_id): Path<i64>,
    Json(req): Json<ReplyTicketRequest>,
) -> Result<Json<TicketResponse>, HttpError> {
    info!(actor = %actor.login_name, ticket_id, "Handling reply_ticket request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TicketResponse = reply_ticket(
        &mut persistence,
        ticket_id,
        &req,
        &actor,
        app_state.cause("Reply to ticket"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::TicketReplied {
        ticket_id,
        status: response.ticket.status.clone(),
    });
    Ok(Json(response))
}

/// POST `/api/tickets/{ticket_id}/status`
pub async fn handle_set_ticket_status(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(ticket_id): Path<i64>,
    Json(req): Json<SetTicketStatusRequest>,
) -> Result<Json<TicketResponse>, HttpError> {
    info!(actor = %actor.login_name, ticket_id, status = %req.status, "Handling set_ticket_status request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TicketResponse = set_ticket_status(
        &mut persistence,
        ticket_id,
        &req,
        &actor,
        app_state.cause("Set ticket status"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::ticket_status(&response.ticket));
    Ok(Json(response))
}

/// POST `/api/tickets/{ticket_id}/assign`
pub async fn handle_assign_ticket(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(ticket_id): Path<i64>,
    Json(req): Json<AssignTicketRequest>,
) -> Result<Json<TicketResponse>, HttpError> {
    info!(actor = %actor.login_name, ticket_id, assignee = req.operator_id, "Handling assign_ticket request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TicketResponse = assign_ticket(
        &mut persistence,
        ticket_id,
        &req,
        &actor,
        app_state.cause("Assign ticket"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::ticket_status(&response.ticket));
    Ok(Json(response))
}

/// POST `/api/tickets/{ticket_id}/close`
pub async fn handle_close_ticket(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(ticket_id): Path<i64>,
) -> Result<Json<TicketResponse>, HttpError> {
    info!(actor = %actor.login_name, ticket_id, "Handling close_ticket request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TicketResponse = close_ticket(
        &mut persistence,
        ticket_id,
        &actor,
        app_state.cause("Close ticket"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::ticket_status(&response.ticket));
    Ok(Json(response))
}
