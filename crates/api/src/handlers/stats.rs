// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dashboard statistics.

use leadhub_persistence::{SqlitePersistence, VendorPipelineStats};
use time::OffsetDateTime;

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::request_response::{DashboardResponse, StatusCount};

/// # Errors
///
/// Returns an error if the actor is not an admin.
pub fn dashboard(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<DashboardResponse, ApiError> {
    AuthorizationService::require_admin(actor, "view dashboard")?;
    Ok(DashboardResponse {
        totals: persistence.dashboard_totals(now)?,
        leads_by_status: persistence
            .count_leads_by_status()?
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        vendors: persistence.all_vendor_pipeline_stats()?,
    })
}

/// The vendor's own pipeline and conversion rate.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator.
pub fn my_pipeline(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
) -> Result<VendorPipelineStats, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "view pipeline")?;
    Ok(persistence.vendor_pipeline_stats(vendor_id)?)
}
