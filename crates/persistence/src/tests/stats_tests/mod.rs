// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use leadhub::{Command, LeadContext, apply};
use leadhub_domain::{Lead, LeadStatus};
use time::macros::datetime;

use crate::tests::{
    TestVendor, admin_apply, create_test_cause, new_lead, now, seed_admin, seed_available_lead,
    seed_lead, seed_lead_with, seed_subscription, seed_vendor,
};
use crate::{DashboardTotals, SqlitePersistence};

fn vendor_apply(
    persistence: &mut SqlitePersistence,
    vendor: &TestVendor,
    lead: &Lead,
    command: Command,
    subscription: Option<&leadhub_domain::Subscription>,
) -> Lead {
    let mut ctx = LeadContext::new(vendor.authority(), now()).with_vendor(&vendor.vendor);
    if let Some(subscription) = subscription {
        ctx = ctx.with_subscription(subscription);
    }
    let transition = apply(lead, command, &ctx, vendor.actor(), create_test_cause()).unwrap();
    persistence.persist_lead_transition(&transition).unwrap();
    persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap()
}

fn advance(persistence: &mut SqlitePersistence, vendor: &TestVendor, lead: Lead, to: LeadStatus) -> Lead {
    vendor_apply(
        persistence,
        vendor,
        &lead,
        Command::Advance { to, notes: None },
        None,
    )
}

#[test]
fn test_empty_database_has_zero_totals() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    assert!(persistence.count_leads_by_status().unwrap().is_empty());
    assert_eq!(
        persistence.dashboard_totals(now()).unwrap(),
        DashboardTotals::default()
    );
    assert!(persistence.all_vendor_pipeline_stats().unwrap().is_empty());
}

#[test]
fn test_vendor_pipeline_and_conversion_rate() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let idle = seed_vendor(&mut persistence, "idle", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 10);

    let mut taken: Vec<Lead> = Vec::new();
    for _ in 0..2 {
        let lead = seed_available_lead(&mut persistence, &admin, "roofing");
        let subscription = persistence
            .get_subscription(subscription.subscription_id.unwrap())
            .unwrap()
            .unwrap();
        taken.push(vendor_apply(
            &mut persistence,
            &vendor,
            &lead,
            Command::Take {
                vendor_id: vendor.vendor_id(),
            },
            Some(&subscription),
        ));
    }

    let mut won = taken.remove(0);
    for to in [
        LeadStatus::Contacted,
        LeadStatus::Interested,
        LeadStatus::Scheduled,
        LeadStatus::InProgress,
        LeadStatus::Completed,
        LeadStatus::Converted,
    ] {
        won = advance(&mut persistence, &vendor, won, to);
    }
    assert_eq!(won.status, LeadStatus::Converted);

    let stats = persistence.vendor_pipeline_stats(vendor.vendor_id()).unwrap();
    assert_eq!(stats.total_taken, 2);
    assert_eq!(stats.converted, 1);
    assert!((stats.conversion_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(
        stats.by_status,
        vec![(String::from("converted"), 1), (String::from("taken"), 1)]
    );

    let nothing = persistence.vendor_pipeline_stats(idle.vendor_id()).unwrap();
    assert_eq!(nothing.total_taken, 0);
    assert!(nothing.conversion_rate.abs() < f64::EPSILON);

    let all = persistence.all_vendor_pipeline_stats().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], stats);
}

#[test]
fn test_dashboard_totals() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let subscription = seed_subscription(&mut persistence, &admin, vendor.vendor_id(), 10);

    seed_lead(&mut persistence, "plumbing");
    seed_lead_with(
        &mut persistence,
        &new_lead("Old Timer", "old@example.com", "plumbing"),
        datetime!(2026-01-15 09:00 UTC),
    );
    let open = seed_available_lead(&mut persistence, &admin, "plumbing");
    let to_take = seed_available_lead(&mut persistence, &admin, "plumbing");
    vendor_apply(
        &mut persistence,
        &vendor,
        &to_take,
        Command::Take {
            vendor_id: vendor.vendor_id(),
        },
        Some(&subscription),
    );
    admin_apply(
        &mut persistence,
        &admin,
        &open,
        Command::Assign {
            vendor_ids: vec![vendor.vendor_id()],
        },
    );

    let totals = persistence.dashboard_totals(now()).unwrap();

    assert_eq!(totals.total_leads, 4);
    assert_eq!(totals.pending_leads, 2);
    assert_eq!(totals.open_leads, 1);
    assert_eq!(totals.taken_leads, 1);
    assert_eq!(totals.converted_leads, 0);
    assert_eq!(totals.leads_last_30_days, 3);
    assert_eq!(totals.active_vendors, 1);
    assert_eq!(totals.active_subscriptions, 1);
    assert_eq!(totals.open_tickets, 0);

    let counts = persistence.count_leads_by_status().unwrap();
    assert_eq!(
        counts,
        vec![
            (String::from("assigned"), 1),
            (String::from("pending"), 2),
            (String::from("taken"), 1),
        ]
    );
}
