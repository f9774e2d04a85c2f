// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vendor self-service: browsing and taking leads, the vendor's own
//! pipeline, subscription and profile.

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
};
use leadhub_api::{
    AddNoteRequest, AvailableLeadInfo, LeadInfo, LeadNoteInfo, LeadTransitionResponse,
    ListLeadsQuery, PageQuery, PurchaseRequest, RefundRequest, SubscriptionResponse,
    UpdateVendorRequest, VendorInfo, VendorResponse, VendorSubscriptionsResponse, add_note,
    get_my_profile, list_available_leads, list_my_leads, my_pipeline, my_subscriptions,
    purchase_plan, request_refund, take_lead, update_my_profile,
};
use leadhub_domain::Page;
use leadhub_persistence::VendorPipelineStats;
use time::OffsetDateTime;
use tracing::info;

use crate::{AppState, HttpError, live::LiveEvent, session::SessionOperator};

/// GET `/api/vendor/leads/available`
pub async fn handle_list_available_leads(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<AvailableLeadInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_available_leads(&mut persistence, &query, &actor)?))
}

/// GET `/api/vendor/leads`: leads this vendor has taken.
pub async fn handle_list_my_leads(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Page<LeadInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_my_leads(&mut persistence, &query, &actor)?))
}

/// POST `/api/vendor/leads/{lead_id}/take`
///
/// Losing the race to another vendor answers 409 and costs no quota.
pub async fn handle_take_lead(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(lead_id, vendor_id = ?actor.vendor_id, "Handling take_lead request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = take_lead(
        &mut persistence,
        lead_id,
        &actor,
        app_state.cause("Take lead"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::for_lead(&response.lead));
    Ok(Json(response))
}

/// POST `/api/vendor/leads/{lead_id}/notes`
pub async fn handle_add_note(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<AddNoteRequest>,
) -> Result<Json<LeadNoteInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let note: LeadNoteInfo = add_note(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(note))
}

/// POST `/api/vendor/leads/{lead_id}/refund`
pub async fn handle_request_refund(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(lead_id): Path<i64>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<LeadTransitionResponse>, HttpError> {
    info!(lead_id, vendor_id = ?actor.vendor_id, "Handling request_refund request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LeadTransitionResponse = request_refund(
        &mut persistence,
        lead_id,
        &req,
        &actor,
        app_state.cause("Request refund"),
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::for_lead(&response.lead));
    Ok(Json(response))
}

/// GET `/api/vendor/subscription`: current subscription and history.
pub async fn handle_my_subscriptions(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
) -> Result<Json<VendorSubscriptionsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(my_subscriptions(
        &mut persistence,
        &actor,
        OffsetDateTime::now_utc(),
    )?))
}

/// POST `/api/vendor/subscription`
pub async fn handle_purchase_plan(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<SubscriptionResponse>, HttpError> {
    info!(vendor_id = ?actor.vendor_id, plan_id = req.plan_id, "Handling purchase_plan request");

    let mut persistence = app_state.persistence.lock().await;
    let response: SubscriptionResponse = purchase_plan(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("Purchase plan"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// GET `/api/vendor/profile`
pub async fn handle_get_profile(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
) -> Result<Json<VendorInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(get_my_profile(&mut persistence, &actor)?))
}

/// PATCH `/api/vendor/profile`
pub async fn handle_update_profile(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<UpdateVendorRequest>,
) -> Result<Json<VendorResponse>, HttpError> {
    info!(vendor_id = ?actor.vendor_id, "Handling update_profile request");

    let mut persistence = app_state.persistence.lock().await;
    let response: VendorResponse = update_my_profile(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("Update profile"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// GET `/api/vendor/pipeline`
pub async fn handle_my_pipeline(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
) -> Result<Json<VendorPipelineStats>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(my_pipeline(&mut persistence, &actor)?))
}
