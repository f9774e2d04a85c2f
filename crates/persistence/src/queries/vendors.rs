// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vendor queries.

use std::collections::HashMap;

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use leadhub_domain::{Page, PageRequest, ServiceCategory, Vendor};
use num_traits::ToPrimitive;
use tracing::debug;

use crate::diesel_schema::{vendor_categories, vendors};
use crate::error::PersistenceError;
use crate::queries::like_pattern;
use crate::timestamps;

#[derive(Queryable, Selectable)]
#[diesel(table_name = vendors)]
struct VendorRow {
    vendor_id: i64,
    business_name: String,
    contact_email: String,
    phone: String,
    service_areas: String,
    is_active: i32,
    created_at: String,
}

impl VendorRow {
    fn into_vendor(self, categories: Vec<String>) -> Result<Vendor, PersistenceError> {
        let categories: Vec<ServiceCategory> = categories
            .iter()
            .map(|c| ServiceCategory::new(c))
            .collect::<Result<_, _>>()?;
        Ok(Vendor {
            vendor_id: Some(self.vendor_id),
            business_name: self.business_name,
            contact_email: self.contact_email,
            phone: self.phone,
            categories,
            service_areas: self.service_areas,
            is_active: self.is_active != 0,
            created_at: timestamps::decode(&self.created_at)?,
        })
    }
}

/// Loads the categories of the given vendors, keyed by vendor id.
fn load_categories(
    conn: &mut SqliteConnection,
    vendor_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>, PersistenceError> {
    let pairs: Vec<(i64, String)> = vendor_categories::table
        .filter(vendor_categories::vendor_id.eq_any(vendor_ids))
        .select((vendor_categories::vendor_id, vendor_categories::category))
        .order_by((vendor_categories::vendor_id, vendor_categories::category))
        .load(conn)?;

    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for (vendor_id, category) in pairs {
        map.entry(vendor_id).or_default().push(category);
    }
    Ok(map)
}

/// Retrieves a vendor by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn get_vendor(
    conn: &mut SqliteConnection,
    vendor_id: i64,
) -> Result<Option<Vendor>, PersistenceError> {
    debug!("Looking up vendor by ID: {}", vendor_id);

    let row: Option<VendorRow> = vendors::table
        .filter(vendors::vendor_id.eq(vendor_id))
        .select(VendorRow::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut categories = load_categories(conn, &[vendor_id])?;
    row.into_vendor(categories.remove(&vendor_id).unwrap_or_default())
        .map(Some)
}

fn filtered<'a>(search: Option<&'a str>, active: Option<bool>) -> vendors::BoxedQuery<'a, Sqlite> {
    let mut query = vendors::table.into_boxed();
    if let Some(active) = active {
        query = query.filter(vendors::is_active.eq(i32::from(active)));
    }
    if let Some(pattern) = search.map(like_pattern) {
        query = query.filter(
            vendors::business_name
                .like(pattern.clone())
                .escape('\\')
                .or(vendors::contact_email.like(pattern).escape('\\')),
        );
    }
    query
}

/// Lists vendors by business name, optionally filtered by a name/email
/// search and the active flag.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_vendors(
    conn: &mut SqliteConnection,
    search: Option<&str>,
    active: Option<bool>,
    request: PageRequest,
) -> Result<Page<Vendor>, PersistenceError> {
    let total: i64 = filtered(search, active).count().get_result(conn)?;

    let rows: Vec<VendorRow> = filtered(search, active)
        .select(VendorRow::as_select())
        .order_by((vendors::business_name.asc(), vendors::vendor_id.asc()))
        .limit(request.limit())
        .offset(request.offset())
        .load(conn)?;

    let ids: Vec<i64> = rows.iter().map(|row| row.vendor_id).collect();
    let mut categories = load_categories(conn, &ids)?;
    let vendors: Vec<Vendor> = rows
        .into_iter()
        .map(|row| {
            let cats: Vec<String> = categories.remove(&row.vendor_id).unwrap_or_default();
            row.into_vendor(cats)
        })
        .collect::<Result<_, _>>()?;

    Ok(Page::new(vendors, request, total.to_u64().unwrap_or_default()))
}
