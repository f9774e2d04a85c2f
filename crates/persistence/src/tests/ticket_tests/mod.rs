// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use leadhub::{NewTicket, TicketCommand, apply_ticket, open_ticket};
use leadhub_audit::AuditSubject;
use leadhub_domain::{
    PageRequest, SupportTicket, TicketCategory, TicketParty, TicketPriority, TicketStatus,
};
use time::Duration;

use crate::tests::{TestVendor, create_test_cause, now, seed_admin, seed_vendor};
use crate::{SqlitePersistence, TicketFilter};

fn open(
    persistence: &mut SqlitePersistence,
    vendor: &TestVendor,
    subject: &str,
    priority: TicketPriority,
) -> SupportTicket {
    let transition = open_ticket(
        &NewTicket {
            subject: subject.to_string(),
            category: TicketCategory::Billing,
            priority,
            lead_id: None,
            body: String::from("Our invoice shows the wrong plan."),
        },
        vendor.authority(),
        vendor.actor(),
        create_test_cause(),
        now(),
    )
    .unwrap();
    let (ticket_id, _) = persistence.insert_ticket(&transition).unwrap();
    persistence.get_ticket(ticket_id).unwrap().unwrap()
}

#[test]
fn test_open_ticket_stores_first_message_and_audit() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let vendor = seed_vendor(&mut persistence, "acme", &[]);

    let ticket = open(&mut persistence, &vendor, "Wrong invoice", TicketPriority::High);
    let ticket_id = ticket.ticket_id.unwrap();

    assert_eq!(ticket.vendor_id, vendor.vendor_id());
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.priority, TicketPriority::High);

    let messages = persistence.list_ticket_messages(ticket_id).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].ticket_id, ticket_id);
    assert_eq!(messages[0].author, TicketParty::Vendor);
    assert_eq!(messages[0].author_operator_id, vendor.operator_id);

    let trail = persistence
        .list_audit_events_for_subject(AuditSubject::Ticket(ticket_id))
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].event.action.name, "OpenTicket");
}

#[test]
fn test_staff_reply_waits_on_vendor() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let admin = seed_admin(&mut persistence);
    let vendor = seed_vendor(&mut persistence, "acme", &[]);
    let ticket = open(&mut persistence, &vendor, "Wrong invoice", TicketPriority::Medium);
    let ticket_id = ticket.ticket_id.unwrap();

    let assigned = apply_ticket(
        &ticket,
        TicketCommand::AssignTo {
            operator_id: admin.operator_id,
        },
        admin.authority(),
        admin.actor(),
        create_test_cause(),
        now() + Duration::minutes(5),
    )
    .unwrap();
    persistence.persist_ticket_transition(&assigned).unwrap();
    let ticket = persistence.get_ticket(ticket_id).unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::InProgress);
    assert_eq!(ticket.assigned_to, Some(admin.operator_id));

    let replied = apply_ticket(
        &ticket,
        TicketCommand::Reply {
            body: String::from("Fixed, please confirm."),
        },
        admin.authority(),
        admin.actor(),
        create_test_cause(),
        now() + Duration::minutes(10),
    )
    .unwrap();
    persistence.persist_ticket_transition(&replied).unwrap();

    let ticket = persistence.get_ticket(ticket_id).unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::AwaitingVendor);
    assert_eq!(ticket.updated_at, now() + Duration::minutes(10));
    let messages = persistence.list_ticket_messages(ticket_id).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].author, TicketParty::Admin);
    assert_eq!(
        persistence
            .list_audit_events_for_subject(AuditSubject::Ticket(ticket_id))
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn test_ticket_listing_filters() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let first = seed_vendor(&mut persistence, "first", &[]);
    let second = seed_vendor(&mut persistence, "second", &[]);
    open(&mut persistence, &first, "Billing question", TicketPriority::Low);
    open(&mut persistence, &first, "Site down", TicketPriority::Urgent);
    open(&mut persistence, &second, "Login issue", TicketPriority::Urgent);

    let mine = persistence
        .list_tickets(
            &TicketFilter {
                vendor_id: Some(first.vendor_id()),
                ..TicketFilter::default()
            },
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(mine.total, 2);
    assert!(mine.items.iter().all(|t| t.vendor_id == first.vendor_id()));

    let urgent = persistence
        .list_tickets(
            &TicketFilter {
                priority: Some(String::from("urgent")),
                ..TicketFilter::default()
            },
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(urgent.total, 2);

    let closed = persistence
        .list_tickets(
            &TicketFilter {
                status: Some(String::from("closed")),
                ..TicketFilter::default()
            },
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(closed.total, 0);
    assert!(closed.items.is_empty());
}
