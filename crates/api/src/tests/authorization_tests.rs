// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Role checks: vendor operators are kept out of admin handlers and
//! admins out of vendor-only ones.

use crate::{
    ApiError, AssignLeadRequest, AuditQuery, CancelLeadRequest, CreatePlanRequest,
    GrantSubscriptionRequest, ListLeadsQuery, ListVendorsQuery, PageQuery, PurchaseRequest,
    SetVendorActiveRequest, UpdateLeadRequest, assign_lead, cancel_lead, create_lead,
    create_plan, create_vendor, dashboard, delete_lead, get_my_profile, grant_subscription,
    lead_audit_trail, list_available_leads, list_leads, list_vendors, my_pipeline,
    my_subscriptions, publish_lead, purchase_plan, recent_audit_events, set_vendor_active,
    take_lead, update_lead,
};

use super::helpers::{
    create_test_cause, create_test_vendor, create_vendor_request, lead_request,
    setup_test_persistence, submit_test_lead, test_now,
};

fn assert_unauthorized<T: std::fmt::Debug>(result: Result<T, ApiError>) {
    assert!(
        matches!(result, Err(ApiError::Unauthorized { .. })),
        "expected Unauthorized, got {result:?}"
    );
}

#[test]
fn test_vendor_rejected_from_lead_administration() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    let lead_id: i64 = submit_test_lead(&mut persistence, "plumbing");
    let cause = create_test_cause;

    assert_unauthorized(create_lead(
        &mut persistence,
        &lead_request("plumbing", "eve@example.com"),
        &vendor,
        cause(),
        test_now(),
    ));
    assert_unauthorized(list_leads(&mut persistence, &ListLeadsQuery::default(), &vendor));
    assert_unauthorized(update_lead(
        &mut persistence,
        lead_id,
        &UpdateLeadRequest::default(),
        &vendor,
        cause(),
        test_now(),
    ));
    assert_unauthorized(delete_lead(&mut persistence, lead_id, &vendor, cause(), test_now()));
    assert_unauthorized(publish_lead(&mut persistence, lead_id, &vendor, cause(), test_now()));
    assert_unauthorized(assign_lead(
        &mut persistence,
        lead_id,
        &AssignLeadRequest {
            vendor_ids: vec![vendor_id],
        },
        &vendor,
        cause(),
        test_now(),
    ));
    assert_unauthorized(cancel_lead(
        &mut persistence,
        lead_id,
        &CancelLeadRequest {
            reason: String::from("Not a real customer"),
        },
        &vendor,
        cause(),
        test_now(),
    ));
    assert_unauthorized(lead_audit_trail(&mut persistence, lead_id, &vendor));
    assert_unauthorized(recent_audit_events(
        &mut persistence,
        &AuditQuery::default(),
        &vendor,
    ));

    let lead = persistence.get_lead(lead_id).unwrap().unwrap();
    assert_eq!(lead.status.as_str(), "pending");
}

#[test]
fn test_vendor_rejected_from_account_administration() {
    let (mut persistence, admin) = setup_test_persistence();
    let (vendor_id, vendor) =
        create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);

    assert_unauthorized(create_vendor(
        &mut persistence,
        &create_vendor_request("Rogue Co", "rogue-co", &[]),
        &vendor,
        create_test_cause(),
        test_now(),
    ));
    assert_unauthorized(list_vendors(&mut persistence, &ListVendorsQuery::default(), &vendor));
    assert_unauthorized(set_vendor_active(
        &mut persistence,
        vendor_id,
        &SetVendorActiveRequest { active: false },
        &vendor,
        create_test_cause(),
        test_now(),
    ));
    assert_unauthorized(create_plan(
        &mut persistence,
        &CreatePlanRequest {
            name: String::from("Free leads"),
            description: String::new(),
            lead_quota: 1_000,
            duration_days: 365,
            price_cents: 0,
        },
        &vendor,
        create_test_cause(),
        test_now(),
    ));
    assert_unauthorized(grant_subscription(
        &mut persistence,
        vendor_id,
        &GrantSubscriptionRequest {
            plan_id: 1,
            payment_reference: None,
        },
        &vendor,
        create_test_cause(),
        test_now(),
    ));
    assert_unauthorized(dashboard(&mut persistence, &vendor, test_now()));
}

#[test]
fn test_admin_rejected_from_vendor_only_handlers() {
    let (mut persistence, admin) = setup_test_persistence();
    let lead_id: i64 = submit_test_lead(&mut persistence, "plumbing");

    assert_unauthorized(list_available_leads(
        &mut persistence,
        &PageQuery::default(),
        &admin,
    ));
    assert_unauthorized(take_lead(&mut persistence, lead_id, &admin, create_test_cause(), test_now()));
    assert_unauthorized(purchase_plan(
        &mut persistence,
        &PurchaseRequest {
            plan_id: 1,
            payment_reference: None,
        },
        &admin,
        create_test_cause(),
        test_now(),
    ));
    assert_unauthorized(my_subscriptions(&mut persistence, &admin, test_now()));
    assert_unauthorized(my_pipeline(&mut persistence, &admin));
    assert_unauthorized(get_my_profile(&mut persistence, &admin));
}

#[test]
fn test_admin_dashboard_counts_marketplace() {
    let (mut persistence, admin) = setup_test_persistence();
    create_test_vendor(&mut persistence, &admin, "Acme Plumbing", "acme-ops", &["plumbing"]);
    submit_test_lead(&mut persistence, "plumbing");
    submit_test_lead(&mut persistence, "roofing");

    let response = dashboard(&mut persistence, &admin, test_now()).unwrap();

    assert_eq!(response.totals.total_leads, 2);
    assert_eq!(response.totals.active_vendors, 1);
    assert!(response.vendors.is_empty());
    let pending = response
        .leads_by_status
        .iter()
        .find(|row| row.status == "pending")
        .unwrap();
    assert_eq!(pending.count, 2);
}
