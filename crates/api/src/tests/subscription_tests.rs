// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plan and subscription handler tests.

use time::Duration;

use crate::{
    ApiError, CreatePlanRequest, PurchaseRequest, RefundRequest, ResolveRefundRequest,
    SetVendorActiveRequest, UpdatePlanRequest, VendorSubscriptionsResponse, cancel_subscription,
    create_plan, list_all_plans, list_public_plans, my_subscriptions, purchase_plan,
    request_refund, resolve_refund, set_vendor_active, take_lead, update_plan,
    vendor_subscriptions,
};

use super::helpers::{
    create_test_cause, create_test_plan, create_test_vendor, published_lead,
    setup_test_persistence, subscribe, test_now,
};

fn purchase(plan_id: i64) -> PurchaseRequest {
    PurchaseRequest {
        plan_id,
        payment_reference: Some(String::from("ch_3PqL9x")),
    }
}

#[test]
fn test_vendor_purchase_starts_full_quota() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    let plan_id: i64 = create_test_plan(&mut persistence, &admin, 10);

    let response = purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    )
    .unwrap();

    let subscription = response.subscription;
    assert_eq!(subscription.vendor_id, vendor_id);
    assert_eq!(subscription.lead_quota, 10);
    assert_eq!(subscription.remaining, 10);
    assert_eq!(subscription.status, "active");
    assert_eq!(subscription.ends_at, test_now() + Duration::days(30));
}

#[test]
fn test_cannot_stack_on_active_subscription() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    subscribe(&mut persistence, &admin, vendor_id, 5);
    let plan_id: i64 = create_test_plan(&mut persistence, &admin, 10);

    let result = purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::Conflict { .. })));
}

#[test]
fn test_exhausted_subscription_can_be_replaced() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    subscribe(&mut persistence, &admin, vendor_id, 1);
    let first: i64 = published_lead(&mut persistence, &admin, "plumbing");
    let second: i64 = published_lead(&mut persistence, &admin, "plumbing");
    take_lead(&mut persistence, first, &vendor, create_test_cause(), test_now()).unwrap();

    let plan_id: i64 = create_test_plan(&mut persistence, &admin, 5);
    purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    )
    .unwrap();
    take_lead(&mut persistence, second, &vendor, create_test_cause(), test_now()).unwrap();

    let subscriptions: VendorSubscriptionsResponse =
        my_subscriptions(&mut persistence, &vendor, test_now()).unwrap();
    assert_eq!(subscriptions.history.len(), 2);
    let current = subscriptions.current.unwrap();
    assert_eq!(current.lead_quota, 5);
    assert_eq!(current.remaining, 4);
}

#[test]
fn test_refund_after_replacement_credits_current_subscription() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    let first_subscription: i64 = subscribe(&mut persistence, &admin, vendor_id, 1);
    let refunded: i64 = published_lead(&mut persistence, &admin, "plumbing");
    take_lead(&mut persistence, refunded, &vendor, create_test_cause(), test_now()).unwrap();

    let plan_id: i64 = create_test_plan(&mut persistence, &admin, 1);
    purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    )
    .unwrap();

    request_refund(
        &mut persistence,
        refunded,
        &RefundRequest {
            reason: String::from("Customer phone number is disconnected"),
        },
        &vendor,
        create_test_cause(),
        test_now() + Duration::days(1),
    )
    .unwrap();
    resolve_refund(
        &mut persistence,
        refunded,
        &ResolveRefundRequest {
            approve: true,
            notes: None,
        },
        &admin,
        create_test_cause(),
        test_now() + Duration::days(2),
    )
    .unwrap();

    let subscriptions: VendorSubscriptionsResponse =
        my_subscriptions(&mut persistence, &vendor, test_now()).unwrap();
    let current = subscriptions.current.unwrap();
    assert_eq!(current.lead_quota, 2);
    assert_eq!(current.remaining, 2);
    let replaced = &subscriptions.history[1];
    assert_eq!(replaced.subscription_id, first_subscription);
    assert_eq!(replaced.remaining, 0);

    // Still active, so buying again is refused with the subscription named.
    let stacked = purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    );
    assert!(matches!(
        stacked,
        Err(ApiError::Conflict { message }) if message.contains("already has active subscription")
    ));

    for _ in 0..2 {
        let lead_id: i64 = published_lead(&mut persistence, &admin, "plumbing");
        take_lead(&mut persistence, lead_id, &vendor, create_test_cause(), test_now()).unwrap();
    }
    let extra: i64 = published_lead(&mut persistence, &admin, "plumbing");
    let exhausted = take_lead(&mut persistence, extra, &vendor, create_test_cause(), test_now());
    assert!(matches!(exhausted, Err(ApiError::Conflict { .. })));

    purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    )
    .unwrap();
    take_lead(&mut persistence, extra, &vendor, create_test_cause(), test_now()).unwrap();
}

#[test]
fn test_cancelled_subscription_stops_takes() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    let subscription_id: i64 = subscribe(&mut persistence, &admin, vendor_id, 5);
    let lead_id: i64 = published_lead(&mut persistence, &admin, "plumbing");

    let cancelled = cancel_subscription(
        &mut persistence,
        subscription_id,
        &admin,
        create_test_cause(),
        test_now(),
    )
    .unwrap();
    assert_eq!(cancelled.subscription.status, "cancelled");

    let result = take_lead(&mut persistence, lead_id, &vendor, create_test_cause(), test_now());
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { rule, .. }) if rule == "active_subscription"
    ));

    let again = cancel_subscription(
        &mut persistence,
        subscription_id,
        &admin,
        create_test_cause(),
        test_now(),
    );
    assert!(again.is_err());
}

#[test]
fn test_subscription_expires_after_duration() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    subscribe(&mut persistence, &admin, vendor_id, 5);

    let later = test_now() + Duration::days(31);
    let current = my_subscriptions(&mut persistence, &vendor, later)
        .unwrap()
        .current
        .unwrap();

    assert_eq!(current.status, "expired");
}

#[test]
fn test_retired_plan_is_hidden_and_not_purchasable() {
    let (mut persistence, admin) = setup_test_persistence();
    let (_vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    let plan_id: i64 = create_test_plan(&mut persistence, &admin, 10);

    update_plan(
        &mut persistence,
        plan_id,
        &UpdatePlanRequest {
            is_active: Some(false),
            ..UpdatePlanRequest::default()
        },
        &admin,
        create_test_cause(),
        test_now(),
    )
    .unwrap();

    assert!(list_public_plans(&mut persistence).unwrap().plans.is_empty());
    assert_eq!(list_all_plans(&mut persistence, &admin).unwrap().plans.len(), 1);
    let result = purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    );
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { rule, .. }) if rule == "plan_active"
    ));
}

#[test]
fn test_plan_edit_keeps_sold_quota() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, _vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    subscribe(&mut persistence, &admin, vendor_id, 5);
    let plan_id: i64 = vendor_subscriptions(&mut persistence, vendor_id, &admin, test_now())
        .unwrap()
        .current
        .unwrap()
        .plan_id;

    update_plan(
        &mut persistence,
        plan_id,
        &UpdatePlanRequest {
            lead_quota: Some(50),
            ..UpdatePlanRequest::default()
        },
        &admin,
        create_test_cause(),
        test_now(),
    )
    .unwrap();

    let current = vendor_subscriptions(&mut persistence, vendor_id, &admin, test_now())
        .unwrap()
        .current
        .unwrap();
    assert_eq!(current.lead_quota, 5);
}

#[test]
fn test_invalid_plan_is_rejected() {
    let (mut persistence, admin) = setup_test_persistence();

    let result = create_plan(
        &mut persistence,
        &CreatePlanRequest {
            name: String::from("Broken"),
            description: String::new(),
            lead_quota: 0,
            duration_days: 30,
            price_cents: 1_000,
        },
        &admin,
        create_test_cause(),
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
}

#[test]
fn test_disabled_vendor_cannot_purchase() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    let plan_id: i64 = create_test_plan(&mut persistence, &admin, 10);
    set_vendor_active(
        &mut persistence,
        vendor_id,
        &SetVendorActiveRequest { active: false },
        &admin,
        create_test_cause(),
        test_now(),
    )
    .unwrap();

    let result = purchase_plan(
        &mut persistence,
        &purchase(plan_id),
        &vendor,
        create_test_cause(),
        test_now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { rule, .. }) if rule == "vendor_active"
    ));
}
