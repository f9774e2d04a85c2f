// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for operator, session and vendor account persistence.

use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, StateSnapshot};
use leadhub_domain::{PageRequest, VendorProfileUpdate};
use time::Duration;

use crate::tests::{create_test_cause, now, seed_admin, seed_vendor};
use crate::{NewOperator, PersistenceError, SqlitePersistence, verify_password};

fn vendor_event(vendor_id: i64, name: &str) -> AuditEvent {
    AuditEvent::new(
        Actor::system(),
        create_test_cause(),
        Action::new(String::from(name), None),
        StateSnapshot::new(String::from("before")),
        StateSnapshot::new(String::from("after")),
        AuditSubject::Vendor(vendor_id),
    )
}

#[test]
fn test_login_lookup_is_case_insensitive() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);

    let operator = persistence
        .get_operator_by_login("  ROOT ")
        .unwrap()
        .unwrap();

    assert_eq!(operator.operator_id, admin.operator_id);
    assert_eq!(operator.login_name, "root");
    assert_eq!(operator.role, "Admin");
    assert!(operator.vendor_id.is_none());
    assert!(verify_password("password123", &operator.password_hash).unwrap());
    assert!(!verify_password("wrong", &operator.password_hash).unwrap());
}

#[test]
fn test_duplicate_login_is_rejected() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    seed_admin(&mut persistence);

    let result = persistence.create_operator(
        NewOperator {
            login_name: "Root",
            display_name: "Another",
            password: "password123",
        },
        "Admin",
        None,
        now(),
    );

    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
}

#[test]
fn test_update_password_for_missing_operator_fails() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    let result = persistence.update_password(42, "new-password");

    assert!(matches!(result, Err(PersistenceError::OperatorNotFound(_))));
}

#[test]
fn test_session_lifecycle() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);

    persistence
        .create_session("fresh", admin.operator_id, now(), now() + Duration::days(30))
        .unwrap();
    persistence
        .create_session(
            "stale",
            admin.operator_id,
            now() - Duration::days(40),
            now() - Duration::days(10),
        )
        .unwrap();

    let session = persistence.get_session_by_token("fresh").unwrap().unwrap();
    assert_eq!(session.operator_id, admin.operator_id);
    assert_eq!(session.expires_at, "2026-05-01T10:00:00Z");

    assert_eq!(persistence.delete_expired_sessions(now()).unwrap(), 1);
    assert!(persistence.get_session_by_token("stale").unwrap().is_none());

    persistence.delete_session("fresh").unwrap();
    assert!(persistence.get_session_by_token("fresh").unwrap().is_none());
}

#[test]
fn test_create_vendor_account_binds_operator_and_audits() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    let vendor = seed_vendor(&mut persistence, "acme", &["plumbing", "roofing"]);

    let stored = persistence.get_vendor(vendor.vendor_id()).unwrap().unwrap();
    assert_eq!(stored.business_name, "acme Services");
    assert_eq!(
        stored
            .categories
            .iter()
            .map(|c| c.as_str().to_string())
            .collect::<Vec<_>>(),
        vec!["plumbing", "roofing"]
    );
    assert!(stored.is_active);

    let operators = persistence.list_vendor_operators(vendor.vendor_id()).unwrap();
    assert_eq!(operators.len(), 1);
    assert_eq!(operators[0].role, "Vendor");
    assert_eq!(operators[0].vendor_id, Some(vendor.vendor_id()));

    let trail = persistence
        .list_audit_events_for_subject(AuditSubject::Vendor(vendor.vendor_id()))
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].event.action.name, "CreateVendor");
}

#[test]
fn test_duplicate_vendor_email_leaves_no_partial_account() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let first = seed_vendor(&mut persistence, "acme", &[]);

    let mut duplicate = first.vendor.clone();
    duplicate.vendor_id = None;
    let result = persistence.create_vendor_account(
        &duplicate,
        NewOperator {
            login_name: "acme2",
            display_name: "Acme Two",
            password: "password123",
        },
        &vendor_event(0, "CreateVendor"),
    );

    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));
    assert!(persistence.get_operator_by_login("acme2").unwrap().is_none());
}

#[test]
fn test_update_vendor_replaces_categories() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let vendor = seed_vendor(&mut persistence, "acme", &["plumbing"]);

    let updated = vendor
        .vendor
        .with_profile(VendorProfileUpdate {
            business_name: Some(String::from("Acme Home")),
            categories: Some(vec![String::from("hvac")]),
            ..VendorProfileUpdate::default()
        })
        .unwrap();
    persistence
        .update_vendor(&updated, &vendor_event(vendor.vendor_id(), "UpdateVendor"), now())
        .unwrap();

    let stored = persistence.get_vendor(vendor.vendor_id()).unwrap().unwrap();
    assert_eq!(stored.business_name, "Acme Home");
    assert_eq!(stored.categories.len(), 1);
    assert_eq!(stored.categories[0].as_str(), "hvac");
}

#[test]
fn test_deactivating_vendor_disables_operators_and_ends_sessions() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    persistence
        .create_session("token", vendor.operator_id, now(), now() + Duration::days(30))
        .unwrap();

    persistence
        .set_vendor_active(
            vendor.vendor_id(),
            false,
            &vendor_event(vendor.vendor_id(), "DeactivateVendor"),
            now(),
        )
        .unwrap();

    assert!(!persistence.get_vendor(vendor.vendor_id()).unwrap().unwrap().is_active);
    let operator = persistence
        .get_operator_by_id(vendor.operator_id)
        .unwrap()
        .unwrap();
    assert!(operator.is_disabled);
    assert!(persistence.get_session_by_token("token").unwrap().is_none());

    persistence
        .set_vendor_active(
            vendor.vendor_id(),
            true,
            &vendor_event(vendor.vendor_id(), "ActivateVendor"),
            now(),
        )
        .unwrap();
    let operator = persistence
        .get_operator_by_id(vendor.operator_id)
        .unwrap()
        .unwrap();
    assert!(!operator.is_disabled);
    assert!(operator.disabled_at.is_none());
}

#[test]
fn test_list_vendors_filters_and_paginates() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    seed_vendor(&mut persistence, "alpha", &[]);
    let beta = seed_vendor(&mut persistence, "beta", &[]);
    seed_vendor(&mut persistence, "gamma", &[]);
    persistence
        .set_vendor_active(
            beta.vendor_id(),
            false,
            &vendor_event(beta.vendor_id(), "DeactivateVendor"),
            now(),
        )
        .unwrap();

    let page = persistence
        .list_vendors(None, Some(true), PageRequest::new(Some(1), Some(1)).unwrap())
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items[0].business_name, "alpha Services");

    let searched = persistence
        .list_vendors(Some("GAM"), None, PageRequest::new(None, None).unwrap())
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.items[0].business_name, "gamma Services");
}
