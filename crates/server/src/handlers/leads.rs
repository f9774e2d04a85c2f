// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lead administration, shared lead views, imports and the audit log.

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
};
use leadhub_api::{
    AdvanceLeadRequest, AssignLeadRequest, AuditEventInfo, AuditQuery, CancelLeadRequest,
    CsvImportRequest, CsvImportResponse, CsvPreviewResponse, EventResponse, LeadDetailResponse,
    LeadInfo, LeadTransitionResponse, ListLeadsQuery, ReassignLeadRequest, ResolveRefundRequest,
    SubmitLeadRequest, UpdateLeadRequest, advance_lead, assign_lead, cancel_lead, create_lead,
    delete_lead, get_lead, import_csv_leads, lead_audit_trail, list_leads, preview_csv_leads,
    publish_lead, reassign_lead, recent_audit_events, resolve_refund, update_lead,
};
use leadhub_domain::Page;
use time::OffsetDateTime;
use tracing::info;

use crate::{AppState, HttpError, live::LiveEvent, session::SessionOperator};

/// Publishes the live event matching a transition and hands the response back.
fn announce(app_state: &AppState, response: LeadTransitionResponse) -> Json<LeadTransitionResponse> {
    app_state.live.broadcast(&LiveEvent::for_lead(&response.lead));
    Json(response)
}

/// GET `/api/admin/leads`
pub async fn handle_list_leads(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Page<LeadInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_leads(&mut persistence, &query, &actor)?))
}

/// POST `/api/admin/leads`: a lead entered by staff, e.g. from a phone call.
pub async fn handle_create_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<SubmitLeadRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, category = %req.category, "Handling create_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = create_lead(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("Create lead"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::LeadSubmitted {
        lead_id: response.lead.lead_id,
    });
    Ok(Json(response))
}

/// GET `/api/admin/leads/{lead_id}` and `/api/vendor/leads/{lead_id}`
pub async fn handle_get_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
) -> Result<Json<LeadDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(get_lead(&mut persistence, lead_id, &actor)?))
}

/// PATCH `/api/admin/leads/{lead_id}`
pub async fn handle_update_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, "Handling update_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = update_lead(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        app_state.cause("Update lead"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// DELETE `/api/admin/leads/{lead_id}`
pub async fn handle_delete_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
) -> Result<Json<EventResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, "Handling delete_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: EventResponse = delete_lead(
        &mut persistence,
        lead_id,
        &actor,
        app_state.cause("Delete lead"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// POST `/api/admin/leads/{lead_id}/publish`
pub async fn handle_publish_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, "Handling publish_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = publish_lead(
        &mut persistence,
        lead_id,
        &actor,
        app_state.cause("Publish lead"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(announce(&app_state, response))
}

/// POST `/api/admin/leads/{lead_id}/assign`
pub async fn handle_assign_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<AssignLeadRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, vendors = ?req.vendor_ids, "Handling assign_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = assign_lead(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        app_state.cause("Assign lead"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(announce(&app_state, response))
}

/// POST `/api/admin/leads/{lead_id}/reassign`
pub async fn handle_reassign_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<ReassignLeadRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, vendor_id = req.vendor_id, "Handling reassign_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = reassign_lead(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        app_state.cause("Reassign lead"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(announce(&app_state, response))
}

/// POST `/api/admin/leads/{lead_id}/cancel`
pub async fn handle_cancel_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<CancelLeadRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, "Handling cancel_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = cancel_lead(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        app_state.cause("Cancel lead"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(announce(&app_state, response))
}

/// POST `/api/admin/leads/{lead_id}/advance` and `/api/vendor/leads/{lead_id}/advance`
pub async fn handle_advance_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<AdvanceLeadRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, status = %req.status, "Handling advance_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = advance_lead(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        app_state.cause("Advance lead"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(announce(&app_state, response))
}

/// POST `/api/admin/leads/{lead_id}/refund`: approve or deny a pending refund.
pub async fn handle_resolve_refund(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<ResolveRefundRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(actor = %actor.login_name, lead_id, approve = req.approve, "Handling resolve_refund request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = resolve_refund(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        app_state.cause("Resolve refund"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    Ok(announce(&app_state, response))
}

/// GET `/api/admin/leads/{lead_id}/audit`
pub async fn handle_lead_audit_trail(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
) -> Result<Json<Vec<AuditEventInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(lead_audit_trail(&mut persistence, lead_id, &actor)?))
}

/// GET `/api/admin/audit?limit=`
pub async fn handle_recent_audit_events(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEventInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(recent_audit_events(&mut persistence, &query, &actor)?))
}

/// POST `/api/admin/leads/import/preview`
///
/// Validates every row without writing anything.
pub async fn handle_preview_import(
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<CsvImportRequest>,
) -> Result<Json<CsvPreviewResponse>, HttpError> {
    info!(actor = %actor.login_name, bytes = req.csv_content.len(), "Handling CSV preview request");
    Ok(Json(preview_csv_leads(&req, &actor, OffsetDateTime::now_utc())?))
}

/// POST `/api/admin/leads/import`
pub async fn handle_import_leads(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<CsvImportRequest>,
) -> Result<Json<CsvImportResponse>, HttpError> {
    info!(actor = %actor.login_name, bytes = req.csv_content.len(), "Handling CSV import request");

    let mut persistence = app_state.persistence.lock().await;
    let response: CsvImportResponse = import_csv_leads(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("CSV lead import"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    for lead_id in &response.lead_ids {
        app_state
            .live
            .broadcast(&LiveEvent::LeadSubmitted { lead_id: *lead_id });
    }
    Ok(Json(response))
}
