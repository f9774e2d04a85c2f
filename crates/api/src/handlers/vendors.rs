// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vendor account handlers.

use leadhub_audit::{AuditEvent, AuditSubject, Cause};
use leadhub_domain::{Page, Vendor, VendorProfileUpdate};
use leadhub_persistence::{CreatedVendorAccount, NewOperator, SqlitePersistence};
use time::OffsetDateTime;
use tracing::info;

use super::{load_vendor, operator_event, page_request, snapshot, vendor_snapshot};
use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    CreateVendorRequest, CreateVendorResponse, ListVendorsQuery, SetVendorActiveRequest,
    SubscriptionInfo, UpdateVendorRequest, VendorDetailResponse, VendorInfo, VendorResponse,
};

/// Creates a vendor and its first login in one step.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, a field is invalid, the
/// password breaks the policy, or the login or email is taken.
pub fn create_vendor(
    persistence: &mut SqlitePersistence,
    request: &CreateVendorRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<CreateVendorResponse, ApiError> {
    AuthorizationService::require_admin(actor, "create vendor")?;

    let mut vendor: Vendor = Vendor::new(
        &request.business_name,
        &request.contact_email,
        &request.phone,
        &request.categories,
        &request.service_areas,
        now,
    )?;
    if request.login_name.trim().is_empty() {
        return Err(ApiError::invalid_input("login_name", "Login name is required"));
    }
    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &request.login_name,
        &request.display_name,
    )?;

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "CreateVendor",
        format!(
            "Created vendor '{}' with login '{}'",
            vendor.business_name,
            request.login_name.trim()
        ),
        snapshot("none"),
        vendor_snapshot(&vendor),
        AuditSubject::Vendor(0),
    );
    let created: CreatedVendorAccount = persistence.create_vendor_account(
        &vendor,
        NewOperator {
            login_name: &request.login_name,
            display_name: &request.display_name,
            password: &request.password,
        },
        &event,
    )?;
    vendor.vendor_id = Some(created.vendor_id);

    info!(
        vendor_id = created.vendor_id,
        operator_id = created.operator_id,
        "Vendor account created"
    );
    Ok(CreateVendorResponse {
        vendor: VendorInfo::from(&vendor),
        operator_id: created.operator_id,
        event_id: created.event_id,
    })
}

/// # Errors
///
/// Returns an error if the actor is not an admin.
pub fn list_vendors(
    persistence: &mut SqlitePersistence,
    query: &ListVendorsQuery,
    actor: &AuthenticatedActor,
) -> Result<Page<VendorInfo>, ApiError> {
    AuthorizationService::require_admin(actor, "list vendors")?;
    let search: Option<&str> = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let page: Page<Vendor> = persistence.list_vendors(
        search,
        query.active,
        page_request(query.page, query.per_page)?,
    )?;
    Ok(page.map(|vendor| VendorInfo::from(&vendor)))
}

/// A vendor with its current subscription, pipeline counts and logins.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the vendor does not
/// exist.
pub fn get_vendor(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<VendorDetailResponse, ApiError> {
    AuthorizationService::require_admin(actor, "view vendor")?;
    let vendor: Vendor = load_vendor(persistence, vendor_id)?;
    let subscription: Option<SubscriptionInfo> = persistence
        .get_latest_subscription(vendor_id)?
        .map(|s| SubscriptionInfo::at(&s, now));
    let pipeline = persistence.vendor_pipeline_stats(vendor_id)?;
    let operators = persistence
        .list_vendor_operators(vendor_id)?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(VendorDetailResponse {
        vendor: VendorInfo::from(&vendor),
        subscription,
        pipeline,
        operators,
    })
}

/// Admin edit of a vendor profile.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the vendor does not
/// exist or a field is invalid.
pub fn update_vendor(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    request: &UpdateVendorRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<VendorResponse, ApiError> {
    AuthorizationService::require_admin(actor, "update vendor")?;
    save_profile(persistence, vendor_id, request, actor, cause, now)
}

/// Enables or disables a vendor. Disabling also disables its logins and
/// ends their sessions.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the vendor does not
/// exist.
pub fn set_vendor_active(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    request: &SetVendorActiveRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<VendorResponse, ApiError> {
    AuthorizationService::require_admin(actor, "change vendor status")?;
    let mut vendor: Vendor = load_vendor(persistence, vendor_id)?;

    let before = vendor_snapshot(&vendor);
    vendor.is_active = request.active;
    let verb: &str = if request.active { "Enabled" } else { "Disabled" };
    let event: AuditEvent = operator_event(
        actor,
        cause,
        "SetVendorActive",
        format!("{verb} vendor '{}'", vendor.business_name),
        before,
        vendor_snapshot(&vendor),
        AuditSubject::Vendor(vendor_id),
    );
    let event_id: i64 = persistence.set_vendor_active(vendor_id, request.active, &event, now)?;

    Ok(VendorResponse {
        vendor: VendorInfo::from(&vendor),
        event_id,
    })
}

/// # Errors
///
/// Returns an error if the actor is not a vendor operator.
pub fn get_my_profile(
    persistence: &mut SqlitePersistence,
    actor: &AuthenticatedActor,
) -> Result<VendorInfo, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "view profile")?;
    Ok(VendorInfo::from(&load_vendor(persistence, vendor_id)?))
}

/// A vendor editing its own profile.
///
/// # Errors
///
/// Returns an error if the actor is not a vendor operator or a field is
/// invalid.
pub fn update_my_profile(
    persistence: &mut SqlitePersistence,
    request: &UpdateVendorRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<VendorResponse, ApiError> {
    let vendor_id: i64 = AuthorizationService::require_vendor(actor, "update profile")?;
    save_profile(persistence, vendor_id, request, actor, cause, now)
}

fn save_profile(
    persistence: &mut SqlitePersistence,
    vendor_id: i64,
    request: &UpdateVendorRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<VendorResponse, ApiError> {
    let vendor: Vendor = load_vendor(persistence, vendor_id)?;
    let updated: Vendor = vendor.with_profile(VendorProfileUpdate {
        business_name: request.business_name.clone(),
        contact_email: request.contact_email.clone(),
        phone: request.phone.clone(),
        categories: request.categories.clone(),
        service_areas: request.service_areas.clone(),
    })?;

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "UpdateVendor",
        format!("Updated profile of vendor '{}'", updated.business_name),
        vendor_snapshot(&vendor),
        vendor_snapshot(&updated),
        AuditSubject::Vendor(vendor_id),
    );
    let event_id: i64 = persistence.update_vendor(&updated, &event, now)?;

    info!(vendor_id, operator_id = actor.operator_id, "Vendor profile updated");
    Ok(VendorResponse {
        vendor: VendorInfo::from(&updated),
        event_id,
    })
}
