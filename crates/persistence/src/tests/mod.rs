// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;
mod lead_tests;
mod operator_tests;
mod stats_tests;
mod subscription_tests;
mod take_tests;
mod ticket_tests;

use leadhub::{
    Authority, Command, LeadContext, Purchase, SubscriptionTransition, apply,
    purchase_subscription,
};
use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};
use leadhub_domain::{Lead, LeadSource, NewLead, Subscription, SubscriptionPlan, Vendor};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{NewOperator, SqlitePersistence};

pub fn now() -> OffsetDateTime {
    datetime!(2026-04-01 10:00 UTC)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

/// An admin operator plus the matching authority and actor.
pub struct TestAdmin {
    pub operator_id: i64,
}

impl TestAdmin {
    pub const fn authority(&self) -> Authority {
        Authority::Admin {
            operator_id: self.operator_id,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::with_operator(
            self.operator_id.to_string(),
            String::from("admin"),
            self.operator_id,
            String::from("root"),
            String::from("Root Admin"),
        )
    }
}

/// A saved vendor with its first operator.
pub struct TestVendor {
    pub vendor: Vendor,
    pub operator_id: i64,
}

impl TestVendor {
    pub fn vendor_id(&self) -> i64 {
        self.vendor.vendor_id.unwrap()
    }

    pub fn authority(&self) -> Authority {
        Authority::Vendor {
            operator_id: self.operator_id,
            vendor_id: self.vendor_id(),
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::with_operator(
            self.operator_id.to_string(),
            String::from("vendor"),
            self.operator_id,
            format!("vendor{}", self.vendor_id()),
            self.vendor.business_name.clone(),
        )
    }
}

pub fn seed_admin(persistence: &mut SqlitePersistence) -> TestAdmin {
    let operator_id = persistence
        .create_operator(
            NewOperator {
                login_name: "root",
                display_name: "Root Admin",
                password: "password123",
            },
            "Admin",
            None,
            now(),
        )
        .unwrap();
    TestAdmin { operator_id }
}

pub fn seed_vendor(
    persistence: &mut SqlitePersistence,
    login: &str,
    categories: &[&str],
) -> TestVendor {
    let categories: Vec<String> = categories.iter().map(ToString::to_string).collect();
    let mut vendor = Vendor::new(
        &format!("{login} Services"),
        &format!("{login}@vendors.test"),
        "5550100",
        &categories,
        "Portland metro",
        now(),
    )
    .unwrap();
    let event = AuditEvent::new(
        Actor::system(),
        create_test_cause(),
        Action::new(String::from("CreateVendor"), None),
        StateSnapshot::new(String::from("none")),
        StateSnapshot::new(String::from("active")),
        AuditSubject::Vendor(0),
    );
    let created = persistence
        .create_vendor_account(
            &vendor,
            NewOperator {
                login_name: login,
                display_name: login,
                password: "password123",
            },
            &event,
        )
        .unwrap();
    vendor.vendor_id = Some(created.vendor_id);
    TestVendor {
        vendor,
        operator_id: created.operator_id,
    }
}

pub fn seed_plan(persistence: &mut SqlitePersistence, quota: i64) -> SubscriptionPlan {
    let mut plan = SubscriptionPlan::new("Growth", "Monthly leads", quota, 30, 9900).unwrap();
    plan.plan_id = Some(persistence.create_plan(&plan).unwrap());
    plan
}

pub fn purchase(
    admin: &TestAdmin,
    vendor_id: i64,
    plan: &SubscriptionPlan,
    current: Option<&Subscription>,
) -> SubscriptionTransition {
    purchase_subscription(
        Purchase {
            vendor_id,
            plan,
            current,
            payment_reference: Some("INV-1"),
        },
        admin.authority(),
        admin.actor(),
        create_test_cause(),
        now(),
    )
    .unwrap()
}

pub fn seed_subscription(
    persistence: &mut SqlitePersistence,
    admin: &TestAdmin,
    vendor_id: i64,
    quota: i64,
) -> Subscription {
    let plan = seed_plan(persistence, quota);
    let transition = purchase(admin, vendor_id, &plan, None);
    let (subscription_id, _) = persistence.insert_subscription(&transition).unwrap();
    persistence
        .get_subscription(subscription_id)
        .unwrap()
        .unwrap()
}

pub fn new_lead(name: &str, email: &str, category: &str) -> NewLead {
    NewLead {
        customer_name: name.to_string(),
        customer_email: email.to_string(),
        customer_phone: String::from("555-867-5309"),
        category: category.to_string(),
        location: String::from("Portland, OR"),
        description: String::from("Needs a quote this month"),
        budget_cents: Some(25_000),
        preferred_date: None,
    }
}

pub fn seed_lead_with(
    persistence: &mut SqlitePersistence,
    input: &NewLead,
    created_at: OffsetDateTime,
) -> Lead {
    let lead = Lead::submit(input, LeadSource::Web, created_at).unwrap();
    let event = AuditEvent::new(
        Actor::customer(),
        create_test_cause(),
        Action::new(String::from("SubmitLead"), None),
        StateSnapshot::new(String::from("none")),
        StateSnapshot::new(String::from("status=pending")),
        AuditSubject::Lead(0),
    );
    let (lead_id, _) = persistence.insert_lead(&lead, &event, None).unwrap();
    persistence.get_lead(lead_id).unwrap().unwrap()
}

pub fn seed_lead(persistence: &mut SqlitePersistence, category: &str) -> Lead {
    seed_lead_with(
        persistence,
        &new_lead("Jamie Ortiz", "jamie@example.com", category),
        datetime!(2026-03-30 08:00 UTC),
    )
}

/// Applies an admin command and persists it, returning the reloaded lead.
pub fn admin_apply(
    persistence: &mut SqlitePersistence,
    admin: &TestAdmin,
    lead: &Lead,
    command: Command,
) -> Lead {
    let ctx = LeadContext::new(admin.authority(), now());
    let transition = apply(lead, command, &ctx, admin.actor(), create_test_cause()).unwrap();
    persistence.persist_lead_transition(&transition).unwrap();
    persistence
        .get_lead(lead.lead_id.unwrap())
        .unwrap()
        .unwrap()
}

/// Seeds a lead in `category` and publishes it.
pub fn seed_available_lead(
    persistence: &mut SqlitePersistence,
    admin: &TestAdmin,
    category: &str,
) -> Lead {
    let lead = seed_lead(persistence, category);
    admin_apply(persistence, admin, &lead, Command::Publish)
}
