// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vendor account mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use leadhub_audit::{AuditEvent, AuditSubject};
use leadhub_domain::Vendor;
use time::OffsetDateTime;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::NewOperator;
use crate::diesel_schema::{vendor_categories, vendors};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::mutations::operators::{
    create_operator, delete_sessions_for_vendor, set_vendor_operators_disabled,
};
use crate::timestamps;

/// Ids written by [`create_vendor_account`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedVendorAccount {
    pub vendor_id: i64,
    pub operator_id: i64,
    pub event_id: i64,
}

fn replace_categories(
    conn: &mut SqliteConnection,
    vendor_id: i64,
    vendor: &Vendor,
) -> Result<(), PersistenceError> {
    diesel::delete(vendor_categories::table)
        .filter(vendor_categories::vendor_id.eq(vendor_id))
        .execute(conn)?;

    let rows: Vec<_> = vendor
        .categories
        .iter()
        .map(|category| {
            (
                vendor_categories::vendor_id.eq(vendor_id),
                vendor_categories::category.eq(category.as_str()),
            )
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(vendor_categories::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

/// Inserts a vendor and its categories.
///
/// # Errors
///
/// Returns an error if the contact email is already registered or the
/// insert fails.
pub fn insert_vendor(conn: &mut SqliteConnection, vendor: &Vendor) -> Result<i64, PersistenceError> {
    diesel::insert_into(vendors::table)
        .values((
            vendors::business_name.eq(&vendor.business_name),
            vendors::contact_email.eq(&vendor.contact_email),
            vendors::phone.eq(&vendor.phone),
            vendors::service_areas.eq(&vendor.service_areas),
            vendors::is_active.eq(i32::from(vendor.is_active)),
            vendors::created_at.eq(timestamps::encode(vendor.created_at)?),
        ))
        .execute(conn)?;

    let vendor_id: i64 = conn.get_last_insert_rowid()?;
    replace_categories(conn, vendor_id, vendor)?;
    Ok(vendor_id)
}

/// Creates a vendor together with its first operator login, in one
/// transaction. The audit event's subject is rewritten to the new vendor.
///
/// # Errors
///
/// Returns an error if the email or login is taken or any write fails.
pub fn create_vendor_account(
    conn: &mut SqliteConnection,
    vendor: &Vendor,
    operator: NewOperator<'_>,
    event: &AuditEvent,
) -> Result<CreatedVendorAccount, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let vendor_id: i64 = insert_vendor(conn, vendor)?;
        let operator_id: i64 =
            create_operator(conn, operator, "Vendor", Some(vendor_id), vendor.created_at)?;

        let mut event: AuditEvent = event.clone();
        event.subject = AuditSubject::Vendor(vendor_id);
        let event_id: i64 = persist_audit_event(conn, &event, vendor.created_at)?;

        info!(vendor_id, operator_id, "Created vendor account");
        Ok(CreatedVendorAccount {
            vendor_id,
            operator_id,
            event_id,
        })
    })
}

/// Saves a vendor's profile and categories.
///
/// # Errors
///
/// Returns an error if the vendor is unsaved or missing, or a write fails.
pub fn update_vendor(
    conn: &mut SqliteConnection,
    vendor: &Vendor,
    event: &AuditEvent,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let vendor_id: i64 = vendor
        .vendor_id
        .ok_or_else(|| PersistenceError::NotFound(String::from("Vendor has not been saved")))?;

    conn.immediate_transaction(|conn| {
        let rows_affected: usize = diesel::update(vendors::table)
            .filter(vendors::vendor_id.eq(vendor_id))
            .set((
                vendors::business_name.eq(&vendor.business_name),
                vendors::contact_email.eq(&vendor.contact_email),
                vendors::phone.eq(&vendor.phone),
                vendors::service_areas.eq(&vendor.service_areas),
            ))
            .execute(conn)?;
        if rows_affected == 0 {
            return Err(PersistenceError::NotFound(format!(
                "Vendor {vendor_id} not found"
            )));
        }
        replace_categories(conn, vendor_id, vendor)?;
        persist_audit_event(conn, event, now)
    })
}

/// Activates or deactivates a vendor.
///
/// Deactivation also disables the vendor's operators and ends their
/// sessions; activation re-enables the operators.
///
/// # Errors
///
/// Returns an error if the vendor is missing or a write fails.
pub fn set_vendor_active(
    conn: &mut SqliteConnection,
    vendor_id: i64,
    active: bool,
    event: &AuditEvent,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let rows_affected: usize = diesel::update(vendors::table)
            .filter(vendors::vendor_id.eq(vendor_id))
            .set(vendors::is_active.eq(i32::from(active)))
            .execute(conn)?;
        if rows_affected == 0 {
            return Err(PersistenceError::NotFound(format!(
                "Vendor {vendor_id} not found"
            )));
        }

        set_vendor_operators_disabled(conn, vendor_id, !active, now)?;
        if !active {
            delete_sessions_for_vendor(conn, vendor_id)?;
        }

        let event_id: i64 = persist_audit_event(conn, event, now)?;
        info!(vendor_id, active, "Changed vendor status");
        Ok(event_id)
    })
}
