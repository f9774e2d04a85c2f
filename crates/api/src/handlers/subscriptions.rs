// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan and subscription handlers.

use leadhub::{
    Purchase, SubscriptionTransition, cancel_subscription as cancel_transition,
    purchase_subscription,
};
use leadhub_audit::{AuditEvent, AuditSubject, Cause, StateSnapshot};
use leadhub_domain::{DomainError, Subscription, SubscriptionPlan, Vendor};
use leadhub_persistence::SqlitePersistence;
use time::OffsetDateTime;
use tracing::info;

use super::{load_plan, load_vendor, operator_event};
use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::request_response::{
    CreatePlanRequest, GrantSubscriptionRequest, ListPlansResponse, PlanInfo, PurchaseRequest,
    SubscriptionInfo, SubscriptionResponse, UpdatePlanRequest, VendorSubscriptionsResponse,
};

fn plan_snapshot(plan: &SubscriptionPlan) -> StateSnapshot {
    StateSnapshot::new(format!(
        "name={},quota={},days={},price_cents={},active={}",
        plan.name, plan.lead_quota, plan.duration_days, plan.price_cents, plan.is_active
    ))
}

/// # Errors
///
/// Returns an error if the actor is not an admin or the plan is invalid.
pub fn create_plan(
    persistence: &mut SqlitePersistence,
    request: &CreatePlanRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<PlanInfo, ApiError> {
    AuthorizationService::require_admin(actor, "create plan")?;
    let mut plan: SubscriptionPlan = SubscriptionPlan::new(
        &request.name,
        &request.description,
        request.lead_quota,
        request.duration_days,
        request.price_cents,
    )?;
    let plan_id: i64 = persistence.create_plan(&plan)?;
    plan.plan_id = Some(plan_id);

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "CreatePlan",
        format!("Created plan {plan_id} '{}'", plan.name),
        StateSnapshot::new(String::from("none")),
        plan_snapshot(&plan),
        AuditSubject::Global,
    );
    persistence.persist_audit_event(&event, now)?;

    info!(plan_id, "Plan created");
    Ok(PlanInfo::from(&plan))
}

/// Edits a plan. Existing subscriptions keep the quota they were sold.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the plan does not exist
/// or the result is invalid.
pub fn update_plan(
    persistence: &mut SqlitePersistence,
    plan_id: i64,
    request: &UpdatePlanRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<PlanInfo, ApiError> {
    AuthorizationService::require_admin(actor, "update plan")?;
    let plan: SubscriptionPlan = load_plan(persistence, plan_id)?;

    let mut updated: SubscriptionPlan = plan.clone();
    if let Some(name) = &request.name {
        updated.name = name.trim().to_string();
    }
    if let Some(description) = &request.description {
        updated.description = description.trim().to_string();
    }
    if let Some(quota) = request.lead_quota {
        updated.lead_quota = quota;
    }
    if let Some(days) = request.duration_days {
        updated.duration_days = days;
    }
    if let Some(price) = request.price_cents {
        updated.price_cents = price;
    }
    if let Some(active) = request.is_active {
        updated.is_active = active;
    }
    updated.validate()?;
    persistence.update_plan(&updated)?;

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "UpdatePlan",
        format!("Updated plan {plan_id}"),
        plan_snapshot(&plan),
        plan_snapshot(&updated),
        AuditSubject::Global,
    );
    persistence.persist_audit_event(&event, now)?;

    Ok(PlanInfo::from(&updated))
}

/// Every plan, including retired ones.
///
/// # Errors
///
/// Returns an error if the actor is not an admin.
pub fn list_all_plans(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
) -> Result<ListPlansResponse, ApiError> {
    AuthorizationService::require_admin(actor, "list plans")?;
    Ok(ListPlansResponse {
        plans: persistence
            .list_plans(false)?
            .iter()
            .map(PlanInfo::from)
            .collect(),
    })
}

fn start_subscription(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    plan_id: i64,
    payment_reference: Option<&str>,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<SubscriptionResponse, ApiError> {
    let plan: SubscriptionPlan = load_plan(persistence, plan_id)?;
    let current: Option<Subscription> = persistence.get_latest_subscription(vendor_id)?;

    let transition: SubscriptionTransition = purchase_subscription(
        Purchase {
            vendor_id,
            plan: &plan,
            current: current.as_ref(),
            payment_reference,
        },
        actor.authority(),
        actor.to_audit_actor(),
        cause,
        now,
    )?;
    let (subscription_id, event_id) = persistence.insert_subscription(&transition)?;

    let mut subscription: Subscription = transition.subscription;
    subscription.subscription_id = Some(subscription_id);
    info!(
        vendor_id,
        plan_id,
        subscription_id,
        lead_quota = subscription.lead_quota,
        "Subscription started"
    );
    Ok(SubscriptionResponse {
        subscription: SubscriptionInfo::at(&subscription, now),
        event_id,
    })
}

/// Admin grant of a plan to a vendor (offline payment, goodwill).
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the vendor or plan does
/// not exist, or the vendor still has an active subscription.
pub fn grant_subscription(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    request: &GrantSubscriptionRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<SubscriptionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "grant subscription")?;
    load_vendor(persistence, vendor_id)?;
    start_subscription(
        persistence,
        vendor_id,
        request.plan_id,
        request.payment_reference.as_deref(),
        actor,
        cause,
        now,
    )
}

/// A vendor buying a plan for itself.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator, the vendor is
/// disabled, the plan is retired, or a subscription is still active.
pub fn purchase_plan(
    persistence: &mut SqlitePersistence,
    request: &PurchaseRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<SubscriptionResponse, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "purchase plan")?;
    let vendor: Vendor = load_vendor(persistence, vendor_id)?;
    if !vendor.is_active {
        return Err(DomainError::VendorInactive(vendor_id).into());
    }
    start_subscription(
        persistence,
        vendor_id,
        request.plan_id,
        request.payment_reference.as_deref(),
        actor,
        cause,
        now,
    )
}

/// Cancels a subscription; unused quota is forfeited.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the subscription does
/// not exist or is already cancelled.
pub fn cancel_subscription(
    persistence: &mut SqlitePersistence,
    subscription_id: i64,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<SubscriptionResponse, ApiError> {
    AuthorizationService::require_admin(actor, "cancel subscription")?;
    let subscription: Subscription = persistence
        .get_subscription(subscription_id)?
        .ok_or(DomainError::SubscriptionNotFound(subscription_id))?;

    let transition: SubscriptionTransition = cancel_transition(
        &subscription,
        actor.authority(),
        actor.to_audit_actor(),
        cause,
        now,
    )?;
    let event_id: i64 = persistence.persist_subscription_update(&transition, now)?;

    info!(subscription_id, vendor_id = subscription.vendor_id, "Subscription cancelled");
    Ok(SubscriptionResponse {
        subscription: SubscriptionInfo::at(&transition.subscription, now),
        event_id,
    })
}

fn subscriptions_of(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    now: OffsetDateTime,
) -> Result<VendorSubscriptionsResponse, ApiError> {
    let history: Vec<SubscriptionInfo> = persistence
        .list_vendor_subscriptions(vendor_id)?
        .iter()
        .map(|s| SubscriptionInfo::at(s, now))
        .collect();
    let current: Option<SubscriptionInfo> = persistence
        .get_latest_subscription(vendor_id)?
        .map(|s| SubscriptionInfo::at(&s, now));
    Ok(VendorSubscriptionsResponse { current, history })
}

/// # Errors
///
/// Returns an error if the actor is not an admin or the vendor does not
/// exist.
pub fn vendor_subscriptions(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<VendorSubscriptionsResponse, ApiError> {
    AuthorizationService::require_admin(actor, "view subscriptions")?;
    load_vendor(persistence, vendor_id)?;
    subscriptions_of(persistence, vendor_id, now)
}

/// The vendor's current subscription and history.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator.
pub fn my_subscriptions(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<VendorSubscriptionsResponse, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "view subscription")?;
    subscriptions_of(persistence, vendor_id, now)
}
