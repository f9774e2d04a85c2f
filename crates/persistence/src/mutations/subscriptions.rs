// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan and subscription mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use leadhub::SubscriptionTransition;
use leadhub_domain::{Subscription, SubscriptionPlan, SubscriptionStatus};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{subscription_plans, subscriptions};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::timestamps;

/// Inserts a plan.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_plan(
    conn: &mut SqliteConnection,
    plan: &SubscriptionPlan,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(subscription_plans::table)
        .values((
            subscription_plans::name.eq(&plan.name),
            subscription_plans::description.eq(&plan.description),
            subscription_plans::lead_quota.eq(plan.lead_quota),
            subscription_plans::duration_days.eq(plan.duration_days),
            subscription_plans::price_cents.eq(plan.price_cents),
            subscription_plans::is_active.eq(i32::from(plan.is_active)),
        ))
        .execute(conn)?;

    let plan_id: i64 = conn.get_last_insert_rowid()?;
    info!(plan_id, name = %plan.name, "Created subscription plan");
    Ok(plan_id)
}

/// Saves a plan. Existing subscriptions keep the quota they were sold.
///
/// # Errors
///
/// Returns an error if the plan is unsaved or missing.
pub fn update_plan(
    conn: &mut SqliteConnection,
    plan: &SubscriptionPlan,
) -> Result<(), PersistenceError> {
    let plan_id: i64 = plan
        .plan_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("Plan has not been saved")))?;

    let rows_affected: usize = diesel::update(subscription_plans::table)
        .filter(subscription_plans::plan_id.eq(plan_id))
        .set((
            subscription_plans::name.eq(&plan.name),
            subscription_plans::description.eq(&plan.description),
            subscription_plans::lead_quota.eq(plan.lead_quota),
            subscription_plans::duration_days.eq(plan.duration_days),
            subscription_plans::price_cents.eq(plan.price_cents),
            subscription_plans::is_active.eq(i32::from(plan.is_active)),
        ))
        .execute(conn)?;
    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!("Plan {plan_id} not found")));
    }
    info!(plan_id, active = plan.is_active, "Updated subscription plan");
    Ok(())
}

/// Inserts a purchased or granted subscription with its audit event.
///
/// The insert is refused if, by the time the write lock is held, the
/// vendor already has another subscription with usable quota.
///
/// # Returns
///
/// `(subscription_id, event_id)`.
///
/// # Errors
///
/// Returns `ActiveSubscriptionExists` if the vendor still holds usable
/// quota, or a database error.
pub fn insert_subscription(
    conn: &mut SqliteConnection,
    transition: &SubscriptionTransition,
) -> Result<(i64, i64), PersistenceError> {
    let subscription: &Subscription = &transition.subscription;
    let now: String = timestamps::encode(subscription.created_at)?;

    conn.immediate_transaction(|conn| {
        let usable: Option<i64> = subscriptions::table
            .filter(subscriptions::vendor_id.eq(subscription.vendor_id))
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::leads_used.lt(subscriptions::lead_quota))
            .filter(subscriptions::ends_at.gt(&now))
            .select(subscriptions::subscription_id)
            .first(conn)
            .optional()?;
        if let Some(subscription_id) = usable {
            return Err(PersistenceError::ActiveSubscriptionExists {
                vendor_id: subscription.vendor_id,
                subscription_id,
            });
        }

        diesel::insert_into(subscriptions::table)
            .values((
                subscriptions::vendor_id.eq(subscription.vendor_id),
                subscriptions::plan_id.eq(subscription.plan_id),
                subscriptions::lead_quota.eq(subscription.lead_quota),
                subscriptions::leads_used.eq(subscription.leads_used),
                subscriptions::starts_at.eq(timestamps::encode(subscription.starts_at)?),
                subscriptions::ends_at.eq(timestamps::encode(subscription.ends_at)?),
                subscriptions::status.eq(subscription.status.as_str()),
                subscriptions::payment_reference.eq(&subscription.payment_reference),
                subscriptions::created_at.eq(&now),
            ))
            .execute(conn)?;
        let subscription_id: i64 = conn.get_last_insert_rowid()?;

        let event_id: i64 =
            persist_audit_event(conn, &transition.audit_event, subscription.created_at)?;
        info!(
            subscription_id,
            vendor_id = subscription.vendor_id,
            quota = subscription.lead_quota,
            "Started subscription"
        );
        Ok((subscription_id, event_id))
    })
}

/// Saves a subscription status change with its audit event.
///
/// # Errors
///
/// Returns an error if the subscription is unsaved or missing.
pub fn persist_subscription_update(
    conn: &mut SqliteConnection,
    transition: &SubscriptionTransition,
    now: time::OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let subscription: &Subscription = &transition.subscription;
    let subscription_id: i64 = subscription.subscription_id.ok_or_else(|| {
        PersistenceError::NotFound(String::from("Subscription has not been saved"))
    })?;

    conn.immediate_transaction(|conn| {
        let rows_affected: usize = diesel::update(subscriptions::table)
            .filter(subscriptions::subscription_id.eq(subscription_id))
            .set(subscriptions::status.eq(subscription.status.as_str()))
            .execute(conn)?;
        if rows_affected == 0 {
            return Err(PersistenceError::NotFound(format!(
                "Subscription {subscription_id} not found"
            )));
        }
        let event_id: i64 = persist_audit_event(conn, &transition.audit_event, now)?;
        info!(subscription_id, status = subscription.status.as_str(), "Updated subscription");
        Ok(event_id)
    })
}
