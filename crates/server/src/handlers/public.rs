// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Anonymous endpoints and session management.

use axum::{Json, extract::State as AxumState};
use leadhub_api::{
    ChangePasswordRequest, ListPlansResponse, LoginRequest, LoginResponse, MessageResponse,
    SubmitLeadRequest, SubmitLeadResponse, WhoAmIResponse, change_password, list_public_plans,
    login, logout, submit_lead, whoami,
};
use time::OffsetDateTime;
use tracing::info;

use crate::{AppState, HttpError, live::LiveEvent, session::SessionOperator};

/// POST `/api/public/leads`: the customer-facing lead form.
pub async fn handle_submit_lead(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<SubmitLeadRequest>,
) -> Result<Json<SubmitLeadResponse>, HttpError> {
    info!(category = %req.category, "Handling submit_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: SubmitLeadResponse = submit_lead(
        &mut persistence,
        &req,
        app_state.cause("Public lead form"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::LeadSubmitted {
        lead_id: response.lead_id,
    });
    Ok(Json(response))
}

/// GET `/api/public/plans`
pub async fn handle_list_public_plans(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ListPlansResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_public_plans(&mut persistence)?))
}

/// POST `/api/session/login`
pub async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(login_name = %req.login_name, "Handling login request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = login(
        &mut persistence,
        &req,
        OffsetDateTime::now_utc(),
        app_state.session_length,
    )?;
    Ok(Json(response))
}

/// POST `/api/session/logout`
pub async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, token): SessionOperator,
) -> Result<Json<MessageResponse>, HttpError> {
    info!(login_name = %actor.login_name, "Handling logout request");

    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(logout(&mut persistence, &token)?))
}

/// GET `/api/session/whoami`
pub async fn handle_whoami(SessionOperator(actor, _token): SessionOperator) -> Json<WhoAmIResponse> {
    Json(whoami(&actor))
}

/// POST `/api/session/password`
///
/// Succeeding ends every session of the operator, including this one.
pub async fn handle_change_password(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    info!(operator_id = actor.operator_id, "Handling change_password request");

    let mut persistence = app_state.persistence.lock().await;
    let response: MessageResponse = change_password(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("Change password"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}
