// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::Authority;
use leadhub_audit::{Actor, Cause};
use leadhub_domain::{
    Lead, LeadSource, LeadStatus, NewLead, Subscription, SubscriptionPlan, Vendor,
};
use time::OffsetDateTime;
use time::macros::datetime;

pub const ADMIN: Authority = Authority::Admin { operator_id: 1 };

pub const fn vendor_authority(vendor_id: i64) -> Authority {
    Authority::Vendor {
        operator_id: 100 + vendor_id,
        vendor_id,
    }
}

pub fn now() -> OffsetDateTime {
    datetime!(2026-04-01 10:00 UTC)
}

pub fn create_test_actor() -> Actor {
    Actor::with_operator(
        String::from("admin-1"),
        String::from("admin"),
        1,
        String::from("root"),
        String::from("Root Admin"),
    )
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Admin request"))
}

pub fn create_test_lead(status: LeadStatus) -> Lead {
    let mut lead = Lead::submit(
        &NewLead {
            customer_name: String::from("Jamie Ortiz"),
            customer_email: String::from("jamie@example.com"),
            customer_phone: String::from("555-867-5309"),
            category: String::from("plumbing"),
            location: String::from("Portland, OR"),
            description: String::from("Kitchen sink leaking"),
            budget_cents: Some(25_000),
            preferred_date: None,
        },
        LeadSource::Web,
        datetime!(2026-03-30 08:00 UTC),
    )
    .unwrap();
    lead.lead_id = Some(10);
    lead.status = status;
    lead
}

/// A lead taken by `vendor_id` at `now()` using subscription 50.
pub fn create_taken_lead(vendor_id: i64, status: LeadStatus) -> Lead {
    let mut lead = create_test_lead(status);
    lead.taken_by = Some(vendor_id);
    lead.taken_at = Some(now());
    lead.subscription_id = Some(50);
    lead
}

pub fn create_test_vendor(vendor_id: i64, categories: &[&str]) -> Vendor {
    let categories: Vec<String> = categories.iter().map(ToString::to_string).collect();
    let mut vendor = Vendor::new(
        "Reliable Plumbing",
        "office@reliable.test",
        "5550100",
        &categories,
        "Portland metro",
        datetime!(2026-01-01 00:00 UTC),
    )
    .unwrap();
    vendor.vendor_id = Some(vendor_id);
    vendor
}

pub fn create_test_plan(quota: i64) -> SubscriptionPlan {
    let mut plan = SubscriptionPlan::new("Growth", "Monthly leads", quota, 30, 9900).unwrap();
    plan.plan_id = Some(7);
    plan
}

pub fn create_test_subscription(vendor_id: i64, quota: i64, used: i64) -> Subscription {
    let mut subscription = Subscription::start(
        vendor_id,
        &create_test_plan(quota),
        None,
        datetime!(2026-03-15 00:00 UTC),
    )
    .unwrap();
    subscription.subscription_id = Some(50);
    subscription.leads_used = used;
    subscription
}
