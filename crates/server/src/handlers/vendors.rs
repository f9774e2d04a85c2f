// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Admin management of vendors, plans and subscriptions.

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
};
use leadhub_api::{
    CreatePlanRequest, CreateVendorRequest, CreateVendorResponse, DashboardResponse,
    GrantSubscriptionRequest, ListPlansResponse, ListVendorsQuery, PlanInfo,
    SetVendorActiveRequest, SubscriptionResponse, UpdatePlanRequest, UpdateVendorRequest,
    VendorDetailResponse, VendorInfo, VendorResponse, VendorSubscriptionsResponse,
    cancel_subscription, create_plan, create_vendor, dashboard, get_vendor, grant_subscription,
    list_all_plans, list_vendors, set_vendor_active, update_plan, update_vendor,
    vendor_subscriptions,
};
use leadhub_domain::Page;
use time::OffsetDateTime;
use tracing::info;

use crate::{AppState, HttpError, session::SessionOperator};

/// POST `/api/admin/vendors`: the vendor and its first login.
pub async fn handle_create_vendor(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<CreateVendorRequest>,
) -> Result<Json<CreateVendorResponse>, HttpError> {
    info!(
        actor = %actor.login_name,
        business_name = %req.business_name,
        login_name = %req.login_name,
        "Handling create_vendor request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateVendorResponse = create_vendor(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("Create vendor"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// GET `/api/admin/vendors`
pub async fn handle_list_vendors(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Query(query): Query<ListVendorsQuery>,
) -> Result<Json<Page<VendorInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_vendors(&mut persistence, &query, &actor)?))
}

/// GET `/api/admin/vendors/{vendor_id}`
pub async fn handle_get_vendor(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(vendor_id): Path<i64>,
) -> Result<Json<VendorDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(get_vendor(
        &mut persistence,
        vendor_id,
        &actor,
        OffsetDateTime::now_utc(),
    )?))
}

/// PATCH `/api/admin/vendors/{vendor_id}`
pub async fn handle_update_vendor(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(vendor_id): Path<i64>,
    Json(req): Json<UpdateVendorRequest>,
) -> Result<Json<VendorResponse>, HttpError> {
    info!(actor = %actor.login_name, vendor_id, "Handling update_vendor request");

    let mut persistence = app_state.persistence.lock().await;
    let response: VendorResponse = update_vendor(
        &mut persistence,
        vendor_id,
        &req,
        &actor,
        app_state.cause("Update vendor"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// POST `/api/admin/vendors/{vendor_id}/active`
pub async fn handle_set_vendor_active(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(vendor_id): Path<i64>,
    Json(req): Json<SetVendorActiveRequest>,
) -> Result<Json<VendorResponse>, HttpError> {
    info!(actor = %actor.login_name, vendor_id, active = req.active, "Handling set_vendor_active request");

    let mut persistence = app_state.persistence.lock().await;
    let response: VendorResponse = set_vendor_active(
        &mut persistence,
        vendor_id,
        &req,
        &actor,
        app_state.cause(if req.active { "Enable vendor" } else { "Disable vendor" }),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// GET `/api/admin/vendors/{vendor_id}/subscriptions`
pub async fn handle_vendor_subscriptions(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(vendor_id): Path<i64>,
) -> Result<Json<VendorSubscriptionsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(vendor_subscriptions(
        &mut persistence,
        vendor_id,
        &actor,
        OffsetDateTime::now_utc(),
    )?))
}

/// POST `/api/admin/vendors/{vendor_id}/subscriptions`: grant a plan without payment.
pub async fn handle_grant_subscription(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(vendor_id): Path<i64>,
    Json(req): Json<GrantSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, HttpError> {
    info!(actor = %actor.login_name, vendor_id, plan_id = req.plan_id, "Handling grant_subscription request");

    let mut persistence = app_state.persistence.lock().await;
    let response: SubscriptionResponse = grant_subscription(
        &mut persistence,
        vendor_id,
        &req,
        &actor,
        app_state.cause("Grant subscription"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// POST `/api/admin/subscriptions/{subscription_id}/cancel`
pub async fn handle_cancel_subscription(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(subscription_id): Path<i64>,
) -> Result<Json<SubscriptionResponse>, HttpError> {
    info!(actor = %actor.login_name, subscription_id, "Handling cancel_subscription request");

    let mut persistence = app_state.persistence.lock().await;
    let response: SubscriptionResponse = cancel_subscription(
        &mut persistence,
        subscription_id,
        &actor,
        app_state.cause("Cancel subscription"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(response))
}

/// GET `/api/admin/plans`: retired plans included.
pub async fn handle_list_all_plans(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
) -> Result<Json<ListPlansResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_all_plans(&mut persistence, &actor)?))
}

/// POST `/api/admin/plans`
pub async fn handle_create_plan(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Json(req): Json<CreatePlanRequest>,
) -> Result<Json<PlanInfo>, HttpError> {
    info!(actor = %actor.login_name, name = %req.name, "Handling create_plan request");

    let mut persistence = app_state.persistence.lock().await;
    let plan: PlanInfo = create_plan(
        &mut persistence,
        &req,
        &actor,
        app_state.cause("Create plan"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(plan))
}

/// PATCH `/api/admin/plans/{plan_id}`
pub async fn handle_update_plan(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
    Path(plan_id): Path<i64>,
    Json(req): Json<UpdatePlanRequest>,
) -> Result<Json<PlanInfo>, HttpError> {
    info!(actor = %actor.login_name, plan_id, "Handling update_plan request");

    let mut persistence = app_state.persistence.lock().await;
    let plan: PlanInfo = update_plan(
        &mut persistence,
        plan_id,
        &req,
        &actor,
        app_state.cause("Update plan"),
        OffsetDateTime::now_utc(),
    )?;
    Ok(Json(plan))
}

/// GET `/api/admin/dashboard`
pub async fn handle_dashboard(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _token): SessionOperator,
) -> Result<Json<DashboardResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(dashboard(
        &mut persistence,
        &actor,
        OffsetDateTime::now_utc(),
    )?))
}
