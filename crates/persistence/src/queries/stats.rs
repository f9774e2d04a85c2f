// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Aggregations for dashboards and vendor pipeline reports.

use std::collections::BTreeMap;

use diesel::SqliteConnection;
use diesel::dsl::count_star;
use diesel::prelude::*;
use leadhub_domain::{LeadStatus, SubscriptionStatus, TicketStatus};
use num_traits::ToPrimitive;
use time::{Duration, OffsetDateTime};

use crate::data_models::{DashboardTotals, VendorPipelineStats};
use crate::diesel_schema::{leads, subscriptions, support_tickets, vendors};
use crate::error::PersistenceError;
use crate::timestamps;

/// Counts every lead by status, sorted by status name. Statuses with no
/// leads are omitted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_leads_by_status(
    conn: &mut SqliteConnection,
) -> Result<Vec<(String, i64)>, PersistenceError> {
    Ok(leads::table
        .group_by(leads::status)
        .select((leads::status, count_star()))
        .order_by(leads::status.asc())
        .load::<(String, i64)>(conn)?)
}

fn pipeline_from_counts(vendor_id: i64, by_status: Vec<(String, i64)>) -> VendorPipelineStats {
    let total_taken: i64 = by_status.iter().map(|(_, n)| n).sum();
    let converted: i64 = by_status
        .iter()
        .find(|(status, _)| status.as_str() == LeadStatus::Converted.as_str())
        .map_or(0, |(_, n)| *n);
    let conversion_rate: f64 = if total_taken == 0 {
        0.0
    } else {
        converted.to_f64().unwrap_or_default() / total_taken.to_f64().unwrap_or(1.0)
    };

    VendorPipelineStats {
        vendor_id,
        total_taken,
        by_status,
        converted,
        conversion_rate,
    }
}

/// Pipeline counts for the leads one vendor owns.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn vendor_pipeline_stats(
    conn: &mut SqliteConnection,
    vendor_id: i64,
) -> Result<VendorPipelineStats, PersistenceError> {
    let by_status: Vec<(String, i64)> = leads::table
        .filter(leads::taken_by.eq(vendor_id))
        .group_by(leads::status)
        .select((leads::status, count_star()))
        .order_by(leads::status.asc())
        .load(conn)?;
    Ok(pipeline_from_counts(vendor_id, by_status))
}

/// Pipeline counts for every vendor that owns at least one lead, ordered
/// by vendor id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn all_vendor_pipeline_stats(
    conn: &mut SqliteConnection,
) -> Result<Vec<VendorPipelineStats>, PersistenceError> {
    let rows: Vec<(Option<i64>, String, i64)> = leads::table
        .filter(leads::taken_by.is_not_null())
        .group_by((leads::taken_by, leads::status))
        .select((leads::taken_by, leads::status, count_star()))
        .load(conn)?;

    let mut grouped: BTreeMap<i64, Vec<(String, i64)>> = BTreeMap::new();
    for (vendor_id, status, count) in rows {
        if let Some(vendor_id) = vendor_id {
            grouped.entry(vendor_id).or_default().push((status, count));
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(vendor_id, mut by_status)| {
            by_status.sort();
            pipeline_from_counts(vendor_id, by_status)
        })
        .collect())
}

/// Headline numbers for the admin dashboard as of `now`.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn dashboard_totals(
    conn: &mut SqliteConnection,
    now: OffsetDateTime,
) -> Result<DashboardTotals, PersistenceError> {
    let now_text: String = timestamps::encode(now)?;
    let month_ago: String = timestamps::encode(now - Duration::days(30))?;

    let by_status: Vec<(String, i64)> = count_leads_by_status(conn)?;
    let count_of = |statuses: &[LeadStatus]| -> i64 {
        by_status
            .iter()
            .filter(|(s, _)| statuses.iter().any(|status| status.as_str() == s.as_str()))
            .map(|(_, n)| n)
            .sum()
    };

    let total_leads: i64 = by_status.iter().map(|(_, n)| n).sum();
    let pending_leads: i64 = count_of(&[LeadStatus::Pending]);
    let open_leads: i64 = count_of(&[LeadStatus::Available, LeadStatus::Assigned]);
    let converted_leads: i64 = count_of(&[LeadStatus::Converted]);
    let refund_requests: i64 = count_of(&[LeadStatus::RefundRequested]);

    let taken_leads: i64 = leads::table
        .filter(leads::taken_by.is_not_null())
        .count()
        .get_result(conn)?;
    let leads_last_30_days: i64 = leads::table
        .filter(leads::created_at.ge(&month_ago))
        .count()
        .get_result(conn)?;
    let active_vendors: i64 = vendors::table
        .filter(vendors::is_active.eq(1))
        .count()
        .get_result(conn)?;
    let active_subscriptions: i64 = subscriptions::table
        .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
        .filter(subscriptions::leads_used.lt(subscriptions::lead_quota))
        .filter(subscriptions::starts_at.le(&now_text))
        .filter(subscriptions::ends_at.gt(&now_text))
        .count()
        .get_result(conn)?;
    let open_tickets: i64 = support_tickets::table
        .filter(support_tickets::status.ne_all([
            TicketStatus::Resolved.as_str(),
            TicketStatus::Closed.as_str(),
        ]))
        .count()
        .get_result(conn)?;

    Ok(DashboardTotals {
        total_leads,
        pending_leads,
        open_leads,
        taken_leads,
        converted_leads,
        refund_requests,
        leads_last_30_days,
        active_vendors,
        active_subscriptions,
        open_tickets,
    })
}
