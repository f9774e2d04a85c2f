// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan and subscription queries.

use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use leadhub_domain::{Subscription, SubscriptionPlan, SubscriptionStatus};
use tracing::debug;

use crate::diesel_schema::{subscription_plans, subscriptions};
use crate::error::PersistenceError;
use crate::timestamps;

#[derive(Queryable, Selectable)]
#[diesel(table_name = subscription_plans)]
struct PlanRow {
    plan_id: i64,
    name: String,
    description: String,
    lead_quota: i64,
    duration_days: i64,
    price_cents: i64,
    is_active: i32,
}

impl From<PlanRow> for SubscriptionPlan {
    fn from(row: PlanRow) -> Self {
        Self {
            plan_id: Some(row.plan_id),
            name: row.name,
            description: row.description,
            lead_quota: row.lead_quota,
            duration_days: row.duration_days,
            price_cents: row.price_cents,
            is_active: row.is_active != 0,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = subscriptions)]
struct SubscriptionRow {
    subscription_id: i64,
    vendor_id: i64,
    plan_id: i64,
    lead_quota: i64,
    leads_used: i64,
    starts_at: String,
    ends_at: String,
    status: String,
    payment_reference: Option<String>,
    created_at: String,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = PersistenceError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            subscription_id: Some(row.subscription_id),
            vendor_id: row.vendor_id,
            plan_id: row.plan_id,
            lead_quota: row.lead_quota,
            leads_used: row.leads_used,
            starts_at: timestamps::decode(&row.starts_at)?,
            ends_at: timestamps::decode(&row.ends_at)?,
            status: SubscriptionStatus::from_str(&row.status)?,
            payment_reference: row.payment_reference,
            created_at: timestamps::decode(&row.created_at)?,
        })
    }
}

/// Retrieves a plan by ID.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_plan(
    conn: &mut SqliteConnection,
    plan_id: i64,
) -> Result<Option<SubscriptionPlan>, PersistenceError> {
    let row: Option<PlanRow> = subscription_plans::table
        .filter(subscription_plans::plan_id.eq(plan_id))
        .select(PlanRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(SubscriptionPlan::from))
}

/// Lists plans by price, optionally only those still offered.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_plans(
    conn: &mut SqliteConnection,
    active_only: bool,
) -> Result<Vec<SubscriptionPlan>, PersistenceError> {
    let mut query = subscription_plans::table
        .select(PlanRow::as_select())
        .order_by((
            subscription_plans::price_cents.asc(),
            subscription_plans::plan_id.asc(),
        ))
        .into_boxed();
    if active_only {
        query = query.filter(subscription_plans::is_active.eq(1));
    }
    let rows: Vec<PlanRow> = query.load(conn)?;
    Ok(rows.into_iter().map(SubscriptionPlan::from).collect())
}

/// Retrieves a subscription by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn get_subscription(
    conn: &mut SqliteConnection,
    subscription_id: i64,
) -> Result<Option<Subscription>, PersistenceError> {
    let row: Option<SubscriptionRow> = subscriptions::table
        .filter(subscriptions::subscription_id.eq(subscription_id))
        .select(SubscriptionRow::as_select())
        .first(conn)
        .optional()?;
    row.map(Subscription::try_from).transpose()
}

/// Returns the vendor's most recently started subscription.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn get_latest_subscription(
    conn: &mut SqliteConnection,
    vendor_id: i64,
) -> Result<Option<Subscription>, PersistenceError> {
    debug!("Looking up latest subscription for vendor {}", vendor_id);

    let row: Option<SubscriptionRow> = subscriptions::table
        .filter(subscriptions::vendor_id.eq(vendor_id))
        .select(SubscriptionRow::as_select())
        .order_by((
            subscriptions::starts_at.desc(),
            subscriptions::subscription_id.desc(),
        ))
        .first(conn)
        .optional()?;
    row.map(Subscription::try_from).transpose()
}

/// Lists all of a vendor's subscriptions, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_vendor_subscriptions(
    conn: &mut SqliteConnection,
    vendor_id: i64,
) -> Result<Vec<Subscription>, PersistenceError> {
    let rows: Vec<SubscriptionRow> = subscriptions::table
        .filter(subscriptions::vendor_id.eq(vendor_id))
        .select(SubscriptionRow::as_select())
        .order_by((
            subscriptions::starts_at.desc(),
            subscriptions::subscription_id.desc(),
        ))
        .load(conn)?;
    rows.into_iter().map(Subscription::try_from).collect()
}
