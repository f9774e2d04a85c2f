// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use leadhub::cancel_subscription;
use leadhub_audit::AuditSubject;
use leadhub_domain::{SubscriptionPlan, SubscriptionStatus};
use time::Duration;

use crate::tests::{
    create_test_cause, now, purchase, seed_admin, seed_plan, seed_subscription, seed_vendor,
};
use crate::{PersistenceError, SqlitePersistence};

#[test]
fn test_plans_are_listed_by_price() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let mut premium = SubscriptionPlan::new("Premium", "Lots", 100, 30, 49_900).unwrap();
    premium.plan_id = Some(persistence.create_plan(&premium).unwrap());
    let starter = SubscriptionPlan::new("Starter", "A few", 5, 30, 2_900).unwrap();
    persistence.create_plan(&starter).unwrap();

    premium.is_active = false;
    persistence.update_plan(&premium).unwrap();

    let all: Vec<String> = persistence
        .list_plans(false)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(all, vec!["Starter", "Premium"]);

    let active = persistence.list_plans(true).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Starter");
}

#[test]
fn test_update_missing_plan_is_not_found() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let mut plan = SubscriptionPlan::new("Ghost", "", 5, 30, 0).unwrap();
    plan.plan_id = Some(404);

    assert!(matches!(
        persistence.update_plan(&plan),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_subscription_round_trip_and_audit() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);

    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 25);

    assert_eq!(subscription.vendor_id, vendor.vendor_id());
    assert_eq!(subscription.lead_quota, 25);
    assert_eq!(subscription.leads_used, 0);
    assert_eq!(subscription.status, SubscriptionStatus::Active);
    assert_eq!(subscription.starts_at, now());
    assert_eq!(subscription.ends_at, now() + Duration::days(30));
    assert_eq!(subscription.payment_reference.as_deref(), Some("INV-1"));

    let latest = persistence
        .get_latest_subscription(vendor.vendor_id())
        .unwrap()
        .unwrap();
    assert_eq!(latest, subscription);

    let trail = persistence
        .list_audit_events_for_subject(AuditSubject::Vendor(vendor.vendor_id()))
        .unwrap();
    assert!(
        trail
            .iter()
            .any(|entry| entry.event.action.name == "PurchaseSubscription")
    );
}

#[test]
fn test_second_active_subscription_is_refused() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let existing = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 10);

    // A purchase computed without seeing the existing subscription.
    let plan = seed_plan(&mut persistence, 20);
    let duplicate = purchase(&admin, vendor.vendor_id(), &plan, None);
    let result = persistence.insert_subscription(&duplicate);

    assert_eq!(
        result,
        Err(PersistenceError::ActiveSubscriptionExists {
            vendor_id: vendor.vendor_id(),
            subscription_id: existing.subscription_id.unwrap(),
        })
    );
    assert_eq!(
        persistence
            .list_vendor_subscriptions(vendor.vendor_id())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_cancelled_subscription_can_be_replaced() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let first = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 10);

    let cancelled = cancel_subscription(
        &first,
        admin.authority(),
        admin.actor(),
        create_test_cause(),
        now(),
    )
    .unwrap();
    persistence
        .persist_subscription_update(&cancelled, now())
        .unwrap();
    let stored = persistence
        .get_subscription(first.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Cancelled);

    let plan = seed_plan(&mut persistence, 40);
    let renewal = purchase(&admin, vendor.vendor_id(), &plan, Some(&stored));
    let (renewal_id, _) = persistence.insert_subscription(&renewal).unwrap();

    let history = persistence
        .list_vendor_subscriptions(vendor.vendor_id())
        .unwrap();
    assert_eq!(history.len(), 2);
    let latest = persistence
        .get_latest_subscription(vendor.vendor_id())
        .unwrap()
        .unwrap();
    assert_eq!(latest.subscription_id, Some(renewal_id));
    assert_eq!(latest.lead_quota, 40);
}

#[test]
fn test_vendor_without_subscription_has_none() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let vendor = seed_vendor(&mut persistence, "acme", &[]);

    assert_eq!(
        persistence
            .get_latest_subscription(vendor.vendor_id())
            .unwrap(),
        None
    );
    assert!(persistence.get_subscription(99).unwrap().is_none());
}
