// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lead mutations.
//!
//! Every write that changes a lead's status also writes one status-history
//! row and one audit event in the same transaction. Taking a lead is a
//! compare-and-set on the lead row combined with a conditional quota
//! increment; either both apply or neither does.

use diesel::SqliteConnection;
use diesel::prelude::*;
use leadhub::{LeadTransition, QuotaEffect, StatusChange};
use leadhub_audit::{AuditEvent, AuditSubject};
use leadhub_domain::{Lead, LeadStatus, SubscriptionStatus};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{lead_notes, lead_status_history, lead_vendors, leads, subscriptions};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::timestamps;

fn insert_lead_row(conn: &mut SqliteConnection, lead: &Lead) -> Result<i64, PersistenceError> {
    let preferred_date: Option<String> =
        lead.preferred_date.map(timestamps::encode_date).transpose()?;

    diesel::insert_into(leads::table)
        .values((
            leads::customer_name.eq(&lead.customer_name),
            leads::customer_email.eq(&lead.customer_email),
            leads::customer_phone.eq(&lead.customer_phone),
            leads::category.eq(lead.category.as_str()),
            leads::location.eq(&lead.location),
            leads::description.eq(&lead.description),
            leads::budget_cents.eq(lead.budget_cents),
            leads::preferred_date.eq(preferred_date),
            leads::source.eq(lead.source.as_str()),
            leads::status.eq(lead.status.as_str()),
            leads::taken_by.eq(lead.taken_by),
            leads::taken_at.eq(timestamps::encode_opt(lead.taken_at)?),
            leads::subscription_id.eq(lead.subscription_id),
            leads::status_before_refund.eq(lead.status_before_refund.map(|s| s.as_str())),
            leads::refund_reason.eq(&lead.refund_reason),
            leads::created_at.eq(timestamps::encode(lead.created_at)?),
            leads::updated_at.eq(timestamps::encode(lead.updated_at)?),
        ))
        .execute(conn)?;

    let lead_id: i64 = conn.get_last_insert_rowid()?;
    replace_assigned_vendors(conn, lead_id, &lead.assigned_vendor_ids)?;
    Ok(lead_id)
}

fn replace_assigned_vendors(
    conn: &mut SqliteConnection,
    lead_id: i64,
    vendor_ids: &[i64],
) -> Result<(), PersistenceError> {
    diesel::delete(lead_vendors::table)
        .filter(lead_vendors::lead_id.eq(lead_id))
        .execute(conn)?;

    let rows: Vec<_> = vendor_ids
        .iter()
        .map(|vendor_id| {
            (
                lead_vendors::lead_id.eq(lead_id),
                lead_vendors::vendor_id.eq(*vendor_id),
            )
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(lead_vendors::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

fn insert_history(
    conn: &mut SqliteConnection,
    lead_id: i64,
    from_status: Option<LeadStatus>,
    change: &StatusChange,
) -> Result<(), PersistenceError> {
    diesel::insert_into(lead_status_history::table)
        .values((
            lead_status_history::lead_id.eq(lead_id),
            lead_status_history::from_status.eq(from_status.map(|s| s.as_str())),
            lead_status_history::to_status.eq(change.to_status.as_str()),
            lead_status_history::changed_by_operator_id.eq(change.changed_by_operator_id),
            lead_status_history::notes.eq(&change.notes),
            lead_status_history::changed_at.eq(timestamps::encode(change.changed_at)?),
        ))
        .execute(conn)?;
    Ok(())
}

fn creation_change(lead: &Lead, changed_by_operator_id: Option<i64>) -> StatusChange {
    StatusChange {
        lead_id: 0,
        from_status: lead.status,
        to_status: lead.status,
        changed_by_operator_id,
        notes: None,
        changed_at: lead.created_at,
    }
}

/// Inserts a new lead with its first history row and audit event.
///
/// The audit event's subject is rewritten to the new lead id.
///
/// # Returns
///
/// `(lead_id, event_id)`.
///
/// # Errors
///
/// Returns an error if any write fails.
pub fn insert_lead(
    conn: &mut SqliteConnection,
    lead: &Lead,
    event: &AuditEvent,
    changed_by_operator_id: Option<i64>,
) -> Result<(i64, i64), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let lead_id: i64 = insert_lead_row(conn, lead)?;
        insert_history(
            conn,
            lead_id,
            None,
            &creation_change(lead, changed_by_operator_id),
        )?;

        let mut event: AuditEvent = event.clone();
        event.subject = AuditSubject::Lead(lead_id);
        let event_id: i64 = persist_audit_event(conn, &event, lead.created_at)?;

        info!(lead_id, status = %lead.status, "Inserted lead");
        Ok((lead_id, event_id))
    })
}

/// Inserts a batch of leads under one audit event.
///
/// Either every lead is written or none is.
///
/// # Errors
///
/// Returns an error if any write fails.
pub fn insert_leads(
    conn: &mut SqliteConnection,
    leads_to_insert: &[Lead],
    event: &AuditEvent,
    changed_by_operator_id: Option<i64>,
    now: OffsetDateTime,
) -> Result<(Vec<i64>, i64), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let mut ids: Vec<i64> = Vec::with_capacity(leads_to_insert.len());
        for lead in leads_to_insert {
            let lead_id: i64 = insert_lead_row(conn, lead)?;
            insert_history(
                conn,
                lead_id,
                None,
                &creation_change(lead, changed_by_operator_id),
            )?;
            ids.push(lead_id);
        }
        let event_id: i64 = persist_audit_event(conn, event, now)?;
        info!(count = ids.len(), "Imported leads");
        Ok((ids, event_id))
    })
}

/// Saves edited customer details of a lead. Status and ownership columns
/// are not touched.
///
/// # Errors
///
/// Returns an error if the lead is unsaved or missing, or a write fails.
pub fn persist_lead_update(
    conn: &mut SqliteConnection,
    lead: &Lead,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let lead_id: i64 = lead
        .lead_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("Lead has not been saved")))?;
    let preferred_date: Option<String> =
        lead.preferred_date.map(timestamps::encode_date).transpose()?;

    conn.immediate_transaction(|conn| {
        let rows_affected: usize = diesel::update(leads::table)
            .filter(leads::lead_id.eq(lead_id))
            .set((
                leads::customer_name.eq(&lead.customer_name),
                leads::customer_email.eq(&lead.customer_email),
                leads::customer_phone.eq(&lead.customer_phone),
                leads::category.eq(lead.category.as_str()),
                leads::location.eq(&lead.location),
                leads::description.eq(&lead.description),
                leads::budget_cents.eq(lead.budget_cents),
                leads::preferred_date.eq(&preferred_date),
                leads::updated_at.eq(timestamps::encode(lead.updated_at)?),
            ))
            .execute(conn)?;
        if rows_affected == 0 {
            return Err(PersistenceError::NotFound(format!("Lead {lead_id} not found")));
        }
        persist_audit_event(conn, event, lead.updated_at)
    })
}

/// Deletes a lead that no vendor has taken.
///
/// History, notes and assignments go with it; tickets referencing the lead
/// keep their thread but lose the link.
///
/// # Errors
///
/// Returns `StaleRecord` if the lead has been taken, `NotFound` if it does
/// not exist.
pub fn delete_lead(
    conn: &mut SqliteConnection,
    lead_id: i64,
    event: &AuditEvent,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let rows_affected: usize = diesel::delete(leads::table)
            .filter(leads::lead_id.eq(lead_id))
            .filter(leads::taken_by.is_null())
            .execute(conn)?;

        if rows_affected == 0 {
            let exists: i64 = leads::table
                .filter(leads::lead_id.eq(lead_id))
                .count()
                .get_result(conn)?;
            return Err(if exists > 0 {
                PersistenceError::StaleRecord(format!("Lead {lead_id} has been taken"))
            } else {
                PersistenceError::NotFound(format!("Lead {lead_id} not found"))
            });
        }

        let event_id: i64 = persist_audit_event(conn, event, now)?;
        info!(lead_id, "Deleted lead");
        Ok(event_id)
    })
}

/// Claims a lead for a vendor and consumes one lead of quota, atomically.
///
/// The lead row is only updated while it is unowned and `available` or
/// `assigned`; the subscription is only charged while it is active, in
/// period and under quota. If either condition fails nothing is written.
///
/// # Errors
///
/// Returns `LeadTakeConflict` if the lead was claimed or moved on first,
/// `QuotaUnavailable` if the subscription cannot supply a lead, or a
/// database error.
pub fn take_lead(
    conn: &mut SqliteConnection,
    transition: &LeadTransition,
) -> Result<i64, PersistenceError> {
    let QuotaEffect::Consume { subscription_id } = transition.quota else {
        return Err(PersistenceError::Other(String::from(
            "take_lead requires a quota-consuming transition",
        )));
    };
    let lead: &Lead = &transition.new_lead;
    let lead_id: i64 = lead
        .lead_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("Lead has not been saved")))?;
    let change: &StatusChange = &transition.status_change;
    let now: String = timestamps::encode(change.changed_at)?;

    conn.immediate_transaction(|conn| {
        let claimed: usize = diesel::update(leads::table)
            .filter(leads::lead_id.eq(lead_id))
            .filter(leads::taken_by.is_null())
            .filter(leads::status.eq_any([
                LeadStatus::Available.as_str(),
                LeadStatus::Assigned.as_str(),
            ]))
            .set((
                leads::status.eq(lead.status.as_str()),
                leads::taken_by.eq(lead.taken_by),
                leads::taken_at.eq(timestamps::encode_opt(lead.taken_at)?),
                leads::subscription_id.eq(subscription_id),
                leads::updated_at.eq(&now),
            ))
            .execute(conn)?;
        if claimed == 0 {
            debug!(lead_id, "Lead take lost the compare-and-set");
            return Err(PersistenceError::LeadTakeConflict { lead_id });
        }

        let charged: usize = diesel::update(subscriptions::table)
            .filter(subscriptions::subscription_id.eq(subscription_id))
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::leads_used.lt(subscriptions::lead_quota))
            .filter(subscriptions::starts_at.le(&now))
            .filter(subscriptions::ends_at.gt(&now))
            .set(subscriptions::leads_used.eq(subscriptions::leads_used + 1))
            .execute(conn)?;
        if charged == 0 {
            debug!(lead_id, subscription_id, "Lead take found no quota");
            return Err(PersistenceError::QuotaUnavailable { subscription_id });
        }

        insert_history(conn, lead_id, Some(change.from_status), change)?;
        let event_id: i64 = persist_audit_event(conn, &transition.audit_event, change.changed_at)?;

        info!(
            lead_id,
            vendor_id = ?lead.taken_by,
            subscription_id,
            "Lead taken"
        );
        Ok(event_id)
    })
}

/// Returns one lead to the vendor whose subscription paid for a refunded
/// lead.
///
/// The credit always lands on that vendor's latest subscription, the only
/// one taking and purchasing consult, so an older subscription never
/// becomes usable again next to a newer one. A used lead is handed back
/// when there is one; a subscription with nothing used yet gets one more
/// lead of quota instead.
fn credit_refunded_lead(
    conn: &mut SqliteConnection,
    lead_id: i64,
    paid_subscription_id: i64,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    let vendor_id: Option<i64> = subscriptions::table
        .filter(subscriptions::subscription_id.eq(paid_subscription_id))
        .select(subscriptions::vendor_id)
        .first(conn)
        .optional()?;
    let Some(vendor_id) = vendor_id else {
        warn!(
            lead_id,
            subscription_id = paid_subscription_id,
            "Refund approved but the paying subscription is gone; no lead credited"
        );
        return Ok(());
    };

    let (target_id, leads_used, status, ends_at): (i64, i64, String, String) =
        subscriptions::table
            .filter(subscriptions::vendor_id.eq(vendor_id))
            .order_by((
                subscriptions::starts_at.desc(),
                subscriptions::subscription_id.desc(),
            ))
            .select((
                subscriptions::subscription_id,
                subscriptions::leads_used,
                subscriptions::status,
                subscriptions::ends_at,
            ))
            .first(conn)?;

    if leads_used > 0 {
        diesel::update(subscriptions::table)
            .filter(subscriptions::subscription_id.eq(target_id))
            .set(subscriptions::leads_used.eq(subscriptions::leads_used - 1))
            .execute(conn)?;
    } else {
        diesel::update(subscriptions::table)
            .filter(subscriptions::subscription_id.eq(target_id))
            .set(subscriptions::lead_quota.eq(subscriptions::lead_quota + 1))
            .execute(conn)?;
    }

    let usable: bool = status == SubscriptionStatus::Active.as_str()
        && timestamps::decode(&ends_at)? > now;
    if usable {
        info!(
            lead_id,
            vendor_id,
            paid_subscription_id,
            credited_subscription_id = target_id,
            "Credited refunded lead"
        );
    } else {
        warn!(
            lead_id,
            vendor_id,
            credited_subscription_id = target_id,
            status = %status,
            "Refund credited to a subscription that is no longer usable"
        );
    }
    Ok(())
}

/// Persists a lead transition produced by the lifecycle engine.
///
/// Takes are routed through [`take_lead`]. Every other transition updates
/// the lead only if its status still matches the one the transition was
/// computed from, then syncs assignments, applies any quota credit and
/// writes the history row and audit event.
///
/// # Returns
///
/// The audit event id.
///
/// # Errors
///
/// Returns `StaleRecord` if the lead changed underneath the caller, or
/// any error from [`take_lead`].
pub fn persist_lead_transition(
    conn: &mut SqliteConnection,
    transition: &LeadTransition,
) -> Result<i64, PersistenceError> {
    if matches!(transition.quota, QuotaEffect::Consume { .. }) {
        return take_lead(conn, transition);
    }

    let lead: &Lead = &transition.new_lead;
    let lead_id: i64 = lead
        .lead_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("Lead has not been saved")))?;
    let change: &StatusChange = &transition.status_change;

    conn.immediate_transaction(|conn| {
        let rows_affected: usize = diesel::update(leads::table)
            .filter(leads::lead_id.eq(lead_id))
            .filter(leads::status.eq(change.from_status.as_str()))
            .set((
                leads::status.eq(lead.status.as_str()),
                leads::taken_by.eq(lead.taken_by),
                leads::taken_at.eq(timestamps::encode_opt(lead.taken_at)?),
                leads::subscription_id.eq(lead.subscription_id),
                leads::status_before_refund.eq(lead.status_before_refund.map(|s| s.as_str())),
                leads::refund_reason.eq(&lead.refund_reason),
                leads::updated_at.eq(timestamps::encode(lead.updated_at)?),
            ))
            .execute(conn)?;
        if rows_affected == 0 {
            return Err(PersistenceError::StaleRecord(format!(
                "Lead {lead_id} is no longer {}",
                change.from_status
            )));
        }

        replace_assigned_vendors(conn, lead_id, &lead.assigned_vendor_ids)?;

        if let QuotaEffect::Credit { subscription_id } = transition.quota {
            credit_refunded_lead(conn, lead_id, subscription_id, change.changed_at)?;
        }

        insert_history(conn, lead_id, Some(change.from_status), change)?;
        let event_id: i64 = persist_audit_event(conn, &transition.audit_event, change.changed_at)?;

        info!(
            lead_id,
            from = %change.from_status,
            to = %change.to_status,
            "Persisted lead transition"
        );
        Ok(event_id)
    })
}

/// Adds a note to a lead.
///
/// # Errors
///
/// Returns an error if the lead or operator does not exist.
pub fn add_lead_note(
    conn: &mut SqliteConnection,
    lead_id: i64,
    vendor_id: Option<i64>,
    author_operator_id: i64,
    body: &str,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(lead_notes::table)
        .values((
            lead_notes::lead_id.eq(lead_id),
            lead_notes::vendor_id.eq(vendor_id),
            lead_notes::author_operator_id.eq(author_operator_id),
            lead_notes::body.eq(body),
            lead_notes::created_at.eq(timestamps::encode(now)?),
        ))
        .execute(conn)?;

    let note_id: i64 = conn.get_last_insert_rowid()?;
    debug!(lead_id, note_id, "Added lead note");
    Ok(note_id)
}
