// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Taking leads, quota coupling and transition persistence.

use leadhub::{Command, LeadContext, LeadTransition, QuotaEffect, apply, cancel_subscription};
use leadhub_audit::AuditSubject;
use leadhub_domain::{Lead, LeadStatus, Subscription, SubscriptionStatus};
use time::Duration;

use crate::tests::{
    TestAdmin, TestVendor, admin_apply, create_test_cause, now, purchase, seed_admin,
    seed_available_lead, seed_plan, seed_subscription, seed_vendor,
};
use crate::{PersistenceError, SqlitePersistence};

fn take_transition(lead: &Lead, vendor: &TestVendor, subscription: &Subscription) -> LeadTransition {
    let ctx = LeadContext::new(vendor.authority(), now())
        .with_vendor(&vendor.vendor)
        .with_subscription(subscription);
    apply(
        lead,
        Command::Take {
            vendor_id: vendor.vendor_id(),
        },
        &ctx,
        vendor.actor(),
        create_test_cause(),
    )
    .unwrap()
}

#[test]
fn test_take_claims_lead_and_consumes_quota() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &["plumbing"]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 2);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");
    let lead_id = lead.lead_id.unwrap();

    let transition = take_transition(&lead, &vendor, &subscription);
    assert!(matches!(transition.quota, QuotaEffect::Consume { .. }));
    persistence.take_lead(&transition).unwrap();

    let stored = persistence.get_lead(lead_id).unwrap().unwrap();
    assert_eq!(stored.status, LeadStatus::Taken);
    assert_eq!(stored.taken_by, Some(vendor.vendor_id()));
    assert_eq!(stored.taken_at, Some(now()));
    assert_eq!(stored.subscription_id, subscription.subscription_id);

    let charged = persistence
        .get_subscription(subscription.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(charged.leads_used, 1);

    let history = persistence.get_lead_history(lead_id).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].from_status.as_deref(), Some("available"));
    assert_eq!(history[2].to_status, "taken");
    assert_eq!(history[2].changed_by_operator_id, Some(vendor.operator_id));

    let trail = persistence
        .list_audit_events_for_subject(AuditSubject::Lead(lead_id))
        .unwrap();
    assert_eq!(trail.len(), 3);
    assert_eq!(trail[2].event.actor.operator_id, Some(vendor.operator_id));
}

#[test]
fn test_second_taker_loses_and_is_not_charged() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let first = seed_vendor(&mut persistence, "first", &[]);
    let second = seed_vendor(&mut persistence, "second", &[]);
    let first_sub = seed_subscription(&mut persistence, &admin, first.vendor_id(), 5);
    let second_sub = seed_subscription(&mut persistence, &admin, second.vendor_id(), 5);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");

    // Both vendors saw the lead as available.
    let winner = take_transition(&lead, &first, &first_sub);
    let loser = take_transition(&lead, &second, &second_sub);

    persistence.persist_lead_transition(&winner).unwrap();
    let result = persistence.persist_lead_transition(&loser);

    assert_eq!(
        result,
        Err(PersistenceError::LeadTakeConflict {
            lead_id: lead.lead_id.unwrap()
        })
    );
    let stored = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.taken_by, Some(first.vendor_id()));
    let untouched = persistence
        .get_subscription(second_sub.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(untouched.leads_used, 0);
    assert_eq!(persistence.get_lead_history(lead.lead_id.unwrap()).unwrap().len(), 3);
}

#[test]
fn test_take_without_quota_rolls_back_the_claim() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 1);
    let first = seed_available_lead(&mut persistence, &admin, "plumbing");
    let second = seed_available_lead(&mut persistence, &admin, "plumbing");

    // Both transitions are computed from the same pre-take subscription.
    let take_first = take_transition(&first, &vendor, &subscription);
    let take_second = take_transition(&second, &vendor, &subscription);
    persistence.take_lead(&take_first).unwrap();

    let result = persistence.take_lead(&take_second);

    assert_eq!(
        result,
        Err(PersistenceError::QuotaUnavailable {
            subscription_id: subscription.subscription_id.unwrap()
        })
    );
    let stored = persistence.get_lead(second.lead_id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.status, LeadStatus::Available);
    assert_eq!(stored.taken_by, None);
    assert_eq!(persistence.get_lead_history(second.lead_id.unwrap()).unwrap().len(), 2);
    let used = persistence
        .get_subscription(subscription.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(used.leads_used, 1);
}

#[test]
fn test_take_against_cancelled_subscription_is_refused() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 3);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");
    let transition = take_transition(&lead, &vendor, &subscription);

    let cancelled = leadhub::cancel_subscription(
        &subscription,
        admin.authority(),
        admin.actor(),
        create_test_cause(),
        now(),
    )
    .unwrap();
    persistence
        .persist_subscription_update(&cancelled, now())
        .unwrap();

    assert!(matches!(
        persistence.take_lead(&transition),
        Err(PersistenceError::QuotaUnavailable { .. })
    ));
}

#[test]
fn test_approved_refund_credits_the_subscription() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 3);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");
    persistence
        .take_lead(&take_transition(&lead, &vendor, &subscription))
        .unwrap();
    let lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();

    let ctx = LeadContext::new(vendor.authority(), now() + Duration::days(2))
        .with_subscription(&subscription);
    let requested = apply(
        &lead,
        Command::RequestRefund {
            reason: String::from("Customer phone number is disconnected"),
        },
        &ctx,
        vendor.actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_lead_transition(&requested).unwrap();
    let lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();
    assert_eq!(lead.status, LeadStatus::RefundRequested);
    assert_eq!(lead.status_before_refund, Some(LeadStatus::Taken));

    let lead = admin_apply(
        &mut persistence,
        &admin,
        &lead,
        Command::ResolveRefund {
            approve: true,
            notes: Some(String::from("Verified")),
        },
    );

    assert_eq!(lead.status, LeadStatus::Refunded);
    let credited = persistence
        .get_subscription(subscription.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(credited.leads_used, 0);
}

/// Takes `lead`, asks for a refund and has the admin approve it.
fn take_and_refund(
    persistence: &mut SqlitePersistence,
    admin: &TestAdmin,
    vendor: &TestVendor,
    lead: &Lead,
    subscription: &Subscription,
    before_approval: impl FnOnce(&mut SqlitePersistence),
) -> Lead {
    persistence
        .take_lead(&take_transition(lead, vendor, subscription))
        .unwrap();
    let lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();
    let paid_with = persistence
        .get_subscription(subscription.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    let requested = apply(
        &lead,
        Command::RequestRefund {
            reason: String::from("Customer never requested a quote"),
        },
        &LeadContext::new(vendor.authority(), now()).with_subscription(&paid_with),
        vendor.actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_lead_transition(&requested).unwrap();
    let lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();

    before_approval(persistence);

    admin_apply(
        persistence,
        admin,
        &lead,
        Command::ResolveRefund {
            approve: true,
            notes: None,
        },
    )
}

#[test]
fn test_refund_after_renewal_credits_the_latest_subscription() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let first = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 1);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");

    let mut renewal_id: i64 = 0;
    let refunded = take_and_refund(
        &mut persistence,
        &admin,
        &vendor,
        &lead,
        &first,
        |persistence| {
            let exhausted = persistence
                .get_subscription(first.subscription_id.unwrap())
                .unwrap()
                .unwrap();
            let plan = seed_plan(persistence, 2);
            let renewal = purchase(&admin, vendor.vendor_id(), &plan, Some(&exhausted));
            renewal_id = persistence.insert_subscription(&renewal).unwrap().0;
        },
    );
    assert_eq!(refunded.status, LeadStatus::Refunded);

    let first = persistence
        .get_subscription(first.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(first.leads_used, 1);
    let latest = persistence
        .get_latest_subscription(vendor.vendor_id())
        .unwrap()
        .unwrap();
    assert_eq!(latest.subscription_id, Some(renewal_id));
    assert_eq!(latest.lead_quota, 3);
    assert_eq!(latest.leads_used, 0);

    // Every remaining lead is reachable through the latest subscription.
    for _ in 0..3 {
        let next = seed_available_lead(&mut persistence, &admin, "plumbing");
        let latest = persistence
            .get_latest_subscription(vendor.vendor_id())
            .unwrap()
            .unwrap();
        persistence
            .take_lead(&take_transition(&next, &vendor, &latest))
            .unwrap();
    }

    let exhausted = persistence
        .get_latest_subscription(vendor.vendor_id())
        .unwrap()
        .unwrap();
    let plan = seed_plan(&mut persistence, 5);
    let again = purchase(&admin, vendor.vendor_id(), &plan, Some(&exhausted));
    assert!(persistence.insert_subscription(&again).is_ok());
}

#[test]
fn test_refund_against_cancelled_subscription_does_not_reopen_it() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 3);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");

    let refunded = take_and_refund(
        &mut persistence,
        &admin,
        &vendor,
        &lead,
        &subscription,
        |persistence| {
            let current = persistence
                .get_subscription(subscription.subscription_id.unwrap())
                .unwrap()
                .unwrap();
            let cancelled = cancel_subscription(
                &current,
                admin.authority(),
                admin.actor(),
                create_test_cause(),
                now(),
            )
            .unwrap();
            persistence
                .persist_subscription_update(&cancelled, now())
                .unwrap();
        },
    );
    assert_eq!(refunded.status, LeadStatus::Refunded);

    let cancelled = persistence
        .get_subscription(subscription.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, SubscriptionStatus::Cancelled);
    assert_eq!(cancelled.leads_used, 0);

    let plan = seed_plan(&mut persistence, 5);
    let renewal = purchase(&admin, vendor.vendor_id(), &plan, Some(&cancelled));
    assert!(persistence.insert_subscription(&renewal).is_ok());
}

#[test]
fn test_denied_refund_restores_status_without_credit() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 3);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");
    persistence
        .take_lead(&take_transition(&lead, &vendor, &subscription))
        .unwrap();
    let lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();

    let ctx = LeadContext::new(vendor.authority(), now()).with_subscription(&subscription);
    let requested = apply(
        &lead,
        Command::RequestRefund {
            reason: String::from("Duplicate of an earlier lead"),
        },
        &ctx,
        vendor.actor(),
        create_test_cause(),
    )
    .unwrap();
    persistence.persist_lead_transition(&requested).unwrap();
    let lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();

    let lead = admin_apply(
        &mut persistence,
        &admin,
        &lead,
        Command::ResolveRefund {
            approve: false,
            notes: None,
        },
    );

    assert_eq!(lead.status, LeadStatus::Taken);
    assert_eq!(lead.status_before_refund, None);
    assert_eq!(lead.refund_reason, None);
    let used = persistence
        .get_subscription(subscription.subscription_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(used.leads_used, 1);
}

#[test]
fn test_transition_from_stale_status_is_rejected() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");

    let ctx = LeadContext::new(admin.authority(), now());
    let assign = apply(
        &lead,
        Command::Assign {
            vendor_ids: vec![vendor.vendor_id()],
        },
        &ctx,
        admin.actor(),
        create_test_cause(),
    )
    .unwrap();
    let cancel = apply(
        &lead,
        Command::Cancel {
            reason: String::from("Customer withdrew"),
        },
        &ctx,
        admin.actor(),
        create_test_cause(),
    )
    .unwrap();

    persistence.persist_lead_transition(&cancel).unwrap();
    let result = persistence.persist_lead_transition(&assign);

    assert!(matches!(result, Err(PersistenceError::StaleRecord(_))));
    let stored = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.status, LeadStatus::Cancelled);
    assert!(stored.assigned_vendor_ids.is_empty());
}

#[test]
fn test_vendor_pipeline_advances_are_persisted() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 3);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");
    persistence
        .take_lead(&take_transition(&lead, &vendor, &subscription))
        .unwrap();
    let mut lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();

    for to in [
        LeadStatus::Contacted,
        LeadStatus::Interested,
        LeadStatus::Scheduled,
    ] {
        let ctx = LeadContext::new(vendor.authority(), now());
        let transition = apply(
            &lead,
            Command::Advance { to, notes: None },
            &ctx,
            vendor.actor(),
            create_test_cause(),
        )
        .unwrap();
        persistence.persist_lead_transition(&transition).unwrap();
        lead = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();
    }

    assert_eq!(lead.status, LeadStatus::Scheduled);
    assert_eq!(lead.taken_by, Some(vendor.vendor_id()));
    let history = persistence.get_lead_history(lead.lead_id.unwrap()).unwrap();
    let statuses: Vec<&str> = history.iter().map(|h| h.to_status.as_str()).collect();
    assert_eq!(
        statuses,
        vec!["pending", "available", "taken", "contacted", "interested", "scheduled"]
    );
}
