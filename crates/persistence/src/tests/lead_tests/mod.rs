// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lead insert, listing, history and deletion tests.

use leadhub::Command;
use leadhub_audit::{Action, AuditEvent, AuditSubject, StateSnapshot};
use leadhub_domain::{
    LeadFilter, LeadSort, LeadStatus, LeadUpdate, PageRequest, ServiceCategory,
};
use time::macros::datetime;

use crate::tests::{
    admin_apply, create_test_cause, new_lead, now, seed_admin, seed_available_lead, seed_lead,
    seed_lead_with, seed_vendor,
};
use crate::{PersistenceError, SqlitePersistence};

fn all() -> PageRequest {
    PageRequest::new(None, None).unwrap()
}

#[test]
fn test_insert_lead_round_trips_and_writes_history() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    let lead = seed_lead(&mut persistence, "plumbing");
    let lead_id = lead.lead_id.unwrap();

    assert_eq!(lead.status, LeadStatus::Pending);
    assert_eq!(lead.customer_email, "jamie@example.com");
    assert_eq!(lead.category.as_str(), "plumbing");
    assert_eq!(lead.budget_cents, Some(25_000));
    assert_eq!(lead.created_at, datetime!(2026-03-30 08:00 UTC));

    let history = persistence.get_lead_history(lead_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[0].to_status, "pending");

    let trail = persistence
        .list_audit_events_for_subject(AuditSubject::Lead(lead_id))
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].event.actor.actor_type, "customer");
}

#[test]
fn test_list_leads_filters_combine() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    seed_lead_with(
        &mut persistence,
        &new_lead("Ana Silva", "ana@example.com", "plumbing"),
        datetime!(2026-03-01 09:00 UTC),
    );
    let roof = seed_lead_with(
        &mut persistence,
        &new_lead("Ben Okafor", "ben@example.com", "roofing"),
        datetime!(2026-03-10 09:00 UTC),
    );
    seed_lead_with(
        &mut persistence,
        &new_lead("Cara Nguyen", "cara@sample.org", "roofing"),
        datetime!(2026-03-20 09:00 UTC),
    );
    admin_apply(&mut persistence, &admin, &roof, Command::Publish);

    let roofing = LeadFilter {
        category: Some(ServiceCategory::new("roofing").unwrap()),
        ..LeadFilter::default()
    };
    let page = persistence.list_leads(&roofing, all()).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].customer_name, "Cara Nguyen", "newest first");

    let available_roofing = LeadFilter {
        status: Some(LeadStatus::Available),
        ..roofing.clone()
    };
    let page = persistence.list_leads(&available_roofing, all()).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].lead_id, roof.lead_id);

    let by_domain = LeadFilter {
        search: Some(String::from("SAMPLE.org")),
        ..LeadFilter::default()
    };
    assert_eq!(persistence.list_leads(&by_domain, all()).unwrap().total, 1);

    let in_range = LeadFilter {
        created_after: Some(datetime!(2026-03-05 00:00 UTC)),
        created_before: Some(datetime!(2026-03-15 00:00 UTC)),
        ..LeadFilter::default()
    };
    let page = persistence.list_leads(&in_range, all()).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].customer_name, "Ben Okafor");
}

#[test]
fn test_list_leads_sorts_and_paginates() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    for day in 1..=5_u8 {
        seed_lead_with(
            &mut persistence,
            &new_lead(&format!("Customer {day}"), "c@example.com", "plumbing"),
            datetime!(2026-03-01 09:00 UTC) + time::Duration::days(i64::from(day)),
        );
    }

    let oldest = LeadFilter {
        sort: LeadSort::Oldest,
        ..LeadFilter::default()
    };
    let page = persistence
        .list_leads(&oldest, PageRequest::new(Some(2), Some(2)).unwrap())
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    let names: Vec<&str> = page.items.iter().map(|l| l.customer_name.as_str()).collect();
    assert_eq!(names, vec!["Customer 3", "Customer 4"]);
}

#[test]
fn test_search_treats_wildcards_literally() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    seed_lead_with(
        &mut persistence,
        &new_lead("Percy Hale", "percy@example.com", "plumbing"),
        now(),
    );

    let filter = LeadFilter {
        search: Some(String::from("%")),
        ..LeadFilter::default()
    };
    assert_eq!(persistence.list_leads(&filter, all()).unwrap().total, 0);
}

#[test]
fn test_available_listing_honors_eligibility() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let roofer = seed_vendor(&mut persistence, "roofer", &["roofing"]);
    let generalist = seed_vendor(&mut persistence, "generalist", &[]);

    let plumbing = seed_available_lead(&mut persistence, &admin, "plumbing");
    let roofing = seed_available_lead(&mut persistence, &admin, "roofing");
    let assigned = seed_lead(&mut persistence, "plumbing");
    let assigned = admin_apply(
        &mut persistence,
        &admin,
        &assigned,
        Command::Assign {
            vendor_ids: vec![roofer.vendor_id()],
        },
    );
    seed_lead(&mut persistence, "roofing");

    let ids = |page: leadhub_domain::Page<leadhub_domain::Lead>| -> Vec<i64> {
        let mut ids: Vec<i64> = page.items.iter().filter_map(|l| l.lead_id).collect();
        ids.sort_unstable();
        ids
    };

    let roofer_sees = ids(persistence
        .list_available_leads(&roofer.vendor, all())
        .unwrap());
    let mut expected = vec![roofing.lead_id.unwrap(), assigned.lead_id.unwrap()];
    expected.sort_unstable();
    assert_eq!(roofer_sees, expected);

    let generalist_sees = ids(persistence
        .list_available_leads(&generalist.vendor, all())
        .unwrap());
    let mut expected = vec![plumbing.lead_id.unwrap(), roofing.lead_id.unwrap()];
    expected.sort_unstable();
    assert_eq!(generalist_sees, expected);

    let mut inactive = generalist.vendor.clone();
    inactive.is_active = false;
    assert_eq!(
        persistence
            .list_available_leads(&inactive, all())
            .unwrap()
            .total,
        0
    );
}

#[test]
fn test_assignment_is_stored_and_replaced() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let a = seed_vendor(&mut persistence, "alpha", &[]);
    let b = seed_vendor(&mut persistence, "beta", &[]);
    let lead = seed_lead(&mut persistence, "plumbing");

    let lead = admin_apply(
        &mut persistence,
        &admin,
        &lead,
        Command::Assign {
            vendor_ids: vec![a.vendor_id(), b.vendor_id()],
        },
    );
    assert_eq!(lead.assigned_vendor_ids, vec![a.vendor_id(), b.vendor_id()]);

    let lead = admin_apply(
        &mut persistence,
        &admin,
        &lead,
        Command::Assign {
            vendor_ids: vec![b.vendor_id()],
        },
    );
    assert_eq!(lead.status, LeadStatus::Assigned);
    assert_eq!(lead.assigned_vendor_ids, vec![b.vendor_id()]);
    assert_eq!(persistence.get_lead_history(lead.lead_id.unwrap()).unwrap().len(), 3);
}

#[test]
fn test_update_details_keeps_status() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let lead = seed_available_lead(&mut persistence, &admin, "plumbing");

    let edited = lead
        .with_update(
            LeadUpdate {
                location: Some(String::from("Salem, OR")),
                budget_cents: Some(None),
                ..LeadUpdate::default()
            },
            now(),
        )
        .unwrap();
    let event = AuditEvent::new(
        admin.actor(),
        create_test_cause(),
        Action::new(String::from("UpdateLead"), None),
        StateSnapshot::new(String::from("before")),
        StateSnapshot::new(String::from("after")),
        AuditSubject::Lead(lead.lead_id.unwrap()),
    );
    persistence.persist_lead_update(&edited, &event).unwrap();

    let stored = persistence.get_lead(lead.lead_id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.location, "Salem, OR");
    assert_eq!(stored.budget_cents, None);
    assert_eq!(stored.status, LeadStatus::Available);
}

#[test]
fn test_delete_lead_removes_history_and_notes() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let lead = seed_lead(&mut persistence, "plumbing");
    let lead_id = lead.lead_id.unwrap();
    persistence
        .add_lead_note(lead_id, None, admin.operator_id, "Called, no answer", now())
        .unwrap();

    let event = AuditEvent::new(
        admin.actor(),
        create_test_cause(),
        Action::new(String::from("DeleteLead"), None),
        StateSnapshot::new(String::from("status=pending")),
        StateSnapshot::new(String::from("deleted")),
        AuditSubject::Lead(lead_id),
    );
    persistence.delete_lead(lead_id, &event, now()).unwrap();

    assert!(persistence.get_lead(lead_id).unwrap().is_none());
    assert!(persistence.get_lead_history(lead_id).unwrap().is_empty());
    assert!(persistence.list_lead_notes(lead_id).unwrap().is_empty());
    // The audit trail outlives the lead.
    assert_eq!(
        persistence
            .list_audit_events_for_subject(AuditSubject::Lead(lead_id))
            .unwrap()
            .len(),
        2
    );

    let again = persistence.delete_lead(lead_id, &event, now());
    assert!(matches!(again, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_bulk_import_is_all_or_nothing() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let good = leadhub_domain::Lead::submit(
        &new_lead("Import One", "one@example.com", "plumbing"),
        leadhub_domain::LeadSource::Import,
        now(),
    )
    .unwrap();
    let event = AuditEvent::new(
        admin.actor(),
        create_test_cause(),
        Action::new(String::from("ImportLeads"), None),
        StateSnapshot::new(String::from("none")),
        StateSnapshot::new(String::from("2 leads")),
        AuditSubject::Global,
    );

    let (ids, _) = persistence
        .insert_leads(&[good.clone(), good.clone()], &event, Some(admin.operator_id), now())
        .unwrap();
    assert_eq!(ids.len(), 2);

    // A lead pointing at a missing owner violates a foreign key and rolls
    // back the whole batch.
    let mut broken = good.clone();
    broken.taken_by = Some(999);
    broken.taken_at = Some(now());
    let result = persistence.insert_leads(&[good, broken], &event, None, now());
    assert!(result.is_err());
    assert_eq!(
        persistence
            .list_leads(&LeadFilter::default(), all())
            .unwrap()
            .total,
        2
    );
}
