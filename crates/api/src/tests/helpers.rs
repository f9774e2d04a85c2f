// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use leadhub_audit::Cause;
use leadhub_persistence::{OperatorData, SqlitePersistence};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    AuthenticatedActor, CreatePlanRequest, CreateVendorRequest, GrantSubscriptionRequest,
    SubmitLeadRequest, bootstrap_admin, create_plan, create_vendor, grant_subscription,
    submit_lead,
};

pub const ADMIN_LOGIN: &str = "root-admin";
pub const PASSWORD: &str = "Harbor-Light-42";

pub const fn test_now() -> OffsetDateTime {
    datetime!(2026-03-02 09:00 UTC)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

fn actor_for(persistence: &mut SqlitePersistence, operator_id: i64) -> AuthenticatedActor {
    let operator: OperatorData = persistence
        .get_operator_by_id(operator_id)
        .expect("Failed to load operator")
        .expect("Operator not found");
    AuthenticatedActor::from_operator(&operator).expect("Operator has an unknown role")
}

/// In-memory database with one bootstrapped administrator.
pub fn setup_test_persistence() -> (SqlitePersistence, AuthenticatedActor) {
    let mut persistence: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("Failed to create persistence");
    let admin_id: i64 = bootstrap_admin(&mut persistence, ADMIN_LOGIN, PASSWORD, test_now())
        .expect("Failed to bootstrap admin")
        .expect("Admin already existed");
    let admin: AuthenticatedActor = actor_for(&mut persistence, admin_id);
    (persistence, admin)
}

pub fn create_vendor_request(name: &str, login: &str, categories: &[&str]) -> CreateVendorRequest {
    CreateVendorRequest {
        business_name: name.to_string(),
        contact_email: format!("{login}@vendors.example.com"),
        phone: String::from("(512) 555-0100"),
        categories: categories.iter().map(ToString::to_string).collect(),
        service_areas: String::from("Austin, Round Rock"),
        login_name: login.to_string(),
        display_name: format!("{name} Desk"),
        password: PASSWORD.to_string(),
        password_confirmation: PASSWORD.to_string(),
    }
}

/// Creates a vendor and returns its id plus its operator as an actor.
pub fn create_test_vendor(
    persistence: &mut SqlitePersistence,
    admin: &AuthenticatedActor,
    name: &str,
    login: &str,
    categories: &[&str],
) -> (i64, AuthenticatedActor) {
    let response = create_vendor(
        persistence,
        &create_vendor_request(name, login, categories),
        admin,
        create_test_cause(),
        test_now(),
    )
    .expect("Failed to create vendor");
    let actor: AuthenticatedActor = actor_for(persistence, response.operator_id);
    (response.vendor.vendor_id, actor)
}

pub fn create_test_plan(
    persistence: &mut SqlitePersistence,
    admin: &AuthenticatedActor,
    lead_quota: i64,
) -> i64 {
    create_plan(
        persistence,
        &CreatePlanRequest {
            name: format!("Starter {lead_quota}"),
            description: String::from("Monthly lead bundle"),
            lead_quota,
            duration_days: 30,
            price_cents: 4_900,
        },
        admin,
        create_test_cause(),
        test_now(),
    )
    .expect("Failed to create plan")
    .plan_id
}

/// Grants a fresh plan with the given quota to the vendor.
pub fn subscribe(
    persistence: &mut SqlitePersistence,
    admin: &AuthenticatedActor,
    vendor_id: i64,
    lead_quota: i64,
) -> i64 {
    let plan_id: i64 = create_test_plan(persistence, admin, lead_quota);
    grant_subscription(
        persistence,
        vendor_id,
        &GrantSubscriptionRequest {
            plan_id,
            payment_reference: Some(String::from("INV-1001")),
        },
        admin,
        create_test_cause(),
        test_now(),
    )
    .expect("Failed to grant subscription")
    .subscription
    .subscription_id
}

pub fn lead_request(category: &str, email: &str) -> SubmitLeadRequest {
    SubmitLeadRequest {
        customer_name: String::from("Dana Whitfield"),
        customer_email: email.to_string(),
        customer_phone: String::from("512-555-0199"),
        category: category.to_string(),
        location: String::from("Austin, TX"),
        description: String::from("Kitchen sink leaks under the cabinet"),
        budget_cents: Some(35_000),
        preferred_date: Some(String::from("2026-03-20")),
    }
}

/// Submits a lead through the public form and returns its id.
pub fn submit_test_lead(persistence: &mut SqlitePersistence, category: &str) -> i64 {
    submit_lead(
        persistence,
        &lead_request(category, "dana@example.com"),
        create_test_cause(),
        test_now(),
    )
    .expect("Failed to submit lead")
    .lead_id
}

/// Submits and publishes a lead so every eligible vendor can take it.
pub fn published_lead(
    persistence: &mut SqlitePersistence,
    admin: &AuthenticatedActor,
    category: &str,
) -> i64 {
    let lead_id: i64 = submit_test_lead(persistence, category);
    crate::publish_lead(persistence, lead_id, admin, create_test_cause(), test_now())
        .expect("Failed to publish lead");
    lead_id
}
