// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lead queries.

use std::collections::HashMap;
use std::str::FromStr;

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use leadhub_domain::{
    Lead, LeadFilter, LeadSort, LeadSource, LeadStatus, Page, PageRequest, ServiceCategory, Vendor,
};
use num_traits::ToPrimitive;
use tracing::debug;

use crate::data_models::{LeadHistoryData, LeadNoteData};
use crate::diesel_schema::{lead_notes, lead_status_history, lead_vendors, leads};
use crate::error::PersistenceError;
use crate::queries::like_pattern;
use crate::timestamps;

#[derive(Queryable, Selectable)]
#[diesel(table_name = leads)]
struct LeadRow {
    lead_id: i64,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    category: String,
    location: String,
    description: String,
    budget_cents: Option<i64>,
    preferred_date: Option<String>,
    source: String,
    status: String,
    taken_by: Option<i64>,
    taken_at: Option<String>,
    subscription_id: Option<i64>,
    status_before_refund: Option<String>,
    refund_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

impl LeadRow {
    fn into_lead(self, assigned_vendor_ids: Vec<i64>) -> Result<Lead, PersistenceError> {
        Ok(Lead {
            lead_id: Some(self.lead_id),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            category: ServiceCategory::new(&self.category)?,
            location: self.location,
            description: self.description,
            budget_cents: self.budget_cents,
            preferred_date: self
                .preferred_date
                .as_deref()
                .map(timestamps::decode_date)
                .transpose()?,
            source: LeadSource::from_str(&self.source)?,
            status: LeadStatus::from_str(&self.status)?,
            assigned_vendor_ids,
            taken_by: self.taken_by,
            taken_at: timestamps::decode_opt(self.taken_at.as_deref())?,
            subscription_id: self.subscription_id,
            status_before_refund: self
                .status_before_refund
                .as_deref()
                .map(LeadStatus::from_str)
                .transpose()?,
            refund_reason: self.refund_reason,
            created_at: timestamps::decode(&self.created_at)?,
            updated_at: timestamps::decode(&self.updated_at)?,
        })
    }
}

/// Loads assigned vendor ids for the given leads, keyed by lead id.
fn load_assignments(
    conn: &mut SqliteConnection,
    lead_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>, PersistenceError> {
    let pairs: Vec<(i64, i64)> = lead_vendors::table
        .filter(lead_vendors::lead_id.eq_any(lead_ids))
        .select((lead_vendors::lead_id, lead_vendors::vendor_id))
        .order_by((lead_vendors::lead_id, lead_vendors::vendor_id))
        .load(conn)?;

    let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
    for (lead_id, vendor_id) in pairs {
        map.entry(lead_id).or_default().push(vendor_id);
    }
    Ok(map)
}

fn rows_into_leads(
    conn: &mut SqliteConnection,
    rows: Vec<LeadRow>,
) -> Result<Vec<Lead>, PersistenceError> {
    let ids: Vec<i64> = rows.iter().map(|row| row.lead_id).collect();
    let mut assignments = load_assignments(conn, &ids)?;
    rows.into_iter()
        .map(|row| {
            let assigned: Vec<i64> = assignments.remove(&row.lead_id).unwrap_or_default();
            row.into_lead(assigned)
        })
        .collect()
}

/// Retrieves a lead by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn get_lead(conn: &mut SqliteConnection, lead_id: i64) -> Result<Option<Lead>, PersistenceError> {
    debug!("Looking up lead by ID: {}", lead_id);

    let row: Option<LeadRow> = leads::table
        .filter(leads::lead_id.eq(lead_id))
        .select(LeadRow::as_select())
        .first(conn)
        .optional()?;

    match row {
        Some(row) => Ok(rows_into_leads(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn filtered(filter: &LeadFilter) -> Result<leads::BoxedQuery<'_, Sqlite>, PersistenceError> {
    let mut query = leads::table.into_boxed();

    if let Some(status) = filter.status {
        query = query.filter(leads::status.eq(status.as_str()));
    }
    if let Some(category) = &filter.category {
        query = query.filter(leads::category.eq(category.as_str()));
    }
    if let Some(vendor_id) = filter.vendor_id {
        query = query.filter(leads::taken_by.eq(vendor_id));
    }
    if let Some(pattern) = filter.search.as_deref().map(like_pattern) {
        query = query.filter(
            leads::customer_name
                .like(pattern.clone())
                .escape('\\')
                .or(leads::customer_email.like(pattern.clone()).escape('\\'))
                .or(leads::customer_phone.like(pattern.clone()).escape('\\'))
                .or(leads::description.like(pattern).escape('\\')),
        );
    }
    if let Some(after) = filter.created_after {
        query = query.filter(leads::created_at.ge(timestamps::encode(after)?));
    }
    if let Some(before) = filter.created_before {
        query = query.filter(leads::created_at.lt(timestamps::encode(before)?));
    }
    Ok(query)
}

/// Lists leads matching `filter`, sorted and paginated.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_leads(
    conn: &mut SqliteConnection,
    filter: &LeadFilter,
    request: PageRequest,
) -> Result<Page<Lead>, PersistenceError> {
    let total: i64 = filtered(filter)?.count().get_result(conn)?;

    let query = filtered(filter)?.select(LeadRow::as_select());
    let query = match filter.sort {
        LeadSort::Newest => query.order_by((leads::created_at.desc(), leads::lead_id.desc())),
        LeadSort::Oldest => query.order_by((leads::created_at.asc(), leads::lead_id.asc())),
        LeadSort::Updated => query.order_by((leads::updated_at.desc(), leads::lead_id.desc())),
    };
    let rows: Vec<LeadRow> = query
        .limit(request.limit())
        .offset(request.offset())
        .load(conn)?;

    let items: Vec<Lead> = rows_into_leads(conn, rows)?;
    Ok(Page::new(items, request, total.to_u64().unwrap_or_default()))
}

fn available_to(vendor_id: i64, categories: &[String]) -> leads::BoxedQuery<'_, Sqlite> {
    let assigned_here = lead_vendors::table
        .filter(lead_vendors::vendor_id.eq(vendor_id))
        .select(lead_vendors::lead_id);
    let assigned = leads::status
        .eq(LeadStatus::Assigned.as_str())
        .and(leads::lead_id.eq_any(assigned_here));
    let open = leads::status.eq(LeadStatus::Available.as_str());

    let query = leads::table
        .into_boxed()
        .filter(leads::taken_by.is_null());
    if categories.is_empty() {
        query.filter(open.or(assigned))
    } else {
        query.filter(open.and(leads::category.eq_any(categories)).or(assigned))
    }
}

/// Lists leads the vendor could take right now, newest first.
///
/// An inactive or unsaved vendor sees nothing.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_available_leads(
    conn: &mut SqliteConnection,
    vendor: &Vendor,
    request: PageRequest,
) -> Result<Page<Lead>, PersistenceError> {
    let Some(vendor_id) = vendor.vendor_id.filter(|_| vendor.is_active) else {
        return Ok(Page::new(Vec::new(), request, 0));
    };
    let categories: Vec<String> = vendor
        .categories
        .iter()
        .map(|c| c.as_str().to_string())
        .collect();

    let total: i64 = available_to(vendor_id, &categories)
        .count()
        .get_result(conn)?;
    let rows: Vec<LeadRow> = available_to(vendor_id, &categories)
        .select(LeadRow::as_select())
        .order_by((leads::created_at.desc(), leads::lead_id.desc()))
        .limit(request.limit())
        .offset(request.offset())
        .load(conn)?;

    let items: Vec<Lead> = rows_into_leads(conn, rows)?;
    Ok(Page::new(items, request, total.to_u64().unwrap_or_default()))
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = lead_status_history)]
struct HistoryRow {
    history_id: i64,
    lead_id: i64,
    from_status: Option<String>,
    to_status: String,
    changed_by_operator_id: Option<i64>,
    notes: Option<String>,
    changed_at: String,
}

/// Returns a lead's status history, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_lead_history(
    conn: &mut SqliteConnection,
    lead_id: i64,
) -> Result<Vec<LeadHistoryData>, PersistenceError> {
    let rows: Vec<HistoryRow> = lead_status_history::table
        .filter(lead_status_history::lead_id.eq(lead_id))
        .select(HistoryRow::as_select())
        .order_by(lead_status_history::history_id.asc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| LeadHistoryData {
            history_id: row.history_id,
            lead_id: row.lead_id,
            from_status: row.from_status,
            to_status: row.to_status,
            changed_by_operator_id: row.changed_by_operator_id,
            notes: row.notes,
            changed_at: row.changed_at,
        })
        .collect())
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = lead_notes)]
struct NoteRow {
    note_id: i64,
    lead_id: i64,
    vendor_id: Option<i64>,
    author_operator_id: i64,
    body: String,
    created_at: String,
}

/// Returns a lead's notes, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_lead_notes(
    conn: &mut SqliteConnection,
    lead_id: i64,
) -> Result<Vec<LeadNoteData>, PersistenceError> {
    let rows: Vec<NoteRow> = lead_notes::table
        .filter(lead_notes::lead_id.eq(lead_id))
        .select(NoteRow::as_select())
        .order_by(lead_notes::note_id.asc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| LeadNoteData {
            note_id: row.note_id,
            lead_id: row.lead_id,
            vendor_id: row.vendor_id,
            author_operator_id: row.author_operator_id,
            body: row.body,
            created_at: row.created_at,
        })
        .collect())
}
