// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Publishing, assignment, pipeline moves, cancellation and reassignment.

use crate::tests::helpers::{
    ADMIN, create_taken_lead, create_test_actor, create_test_cause, create_test_lead,
    create_test_vendor, now, vendor_authority,
};
use crate::{Command, CoreError, LeadContext, LeadTransition, QuotaEffect, apply};
use leadhub_audit::AuditSubject;
use leadhub_domain::{DomainError, LeadStatus};

fn run(
    lead: &leadhub_domain::Lead,
    command: Command,
    ctx: &LeadContext<'_>,
) -> Result<LeadTransition, CoreError> {
    apply(lead, command, ctx, create_test_actor(), create_test_cause())
}

#[test]
fn test_publish_moves_pending_to_available() {
    let lead = create_test_lead(LeadStatus::Pending);
    let transition = run(&lead, Command::Publish, &LeadContext::new(ADMIN, now())).unwrap();

    assert_eq!(transition.new_lead.status, LeadStatus::Available);
    assert_eq!(transition.new_lead.updated_at, now());
    assert_eq!(transition.quota, QuotaEffect::None);
    assert_eq!(transition.status_change.from_status, LeadStatus::Pending);
    assert_eq!(transition.status_change.to_status, LeadStatus::Available);
}

#[test]
fn test_transition_emits_exactly_one_audit_event() {
    let lead = create_test_lead(LeadStatus::Pending);
    let transition = run(&lead, Command::Publish, &LeadContext::new(ADMIN, now())).unwrap();

    let event = transition.audit_event;
    assert_eq!(event.action.name, "PublishLead");
    assert_eq!(event.actor.operator_id, Some(1));
    assert_eq!(event.cause.id, "req-456");
    assert_eq!(event.subject, AuditSubject::Lead(10));
    assert!(event.before.data.contains("status=pending"));
    assert!(event.after.data.contains("status=available"));
}

#[test]
fn test_vendor_cannot_publish() {
    let lead = create_test_lead(LeadStatus::Pending);
    let result = run(
        &lead,
        Command::Publish,
        &LeadContext::new(vendor_authority(3), now()),
    );
    assert!(matches!(result, Err(CoreError::Forbidden { .. })));
}

#[test]
fn test_publish_from_taken_is_rejected() {
    let lead = create_taken_lead(3, LeadStatus::Taken);
    let result = run(&lead, Command::Publish, &LeadContext::new(ADMIN, now()));
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[test]
fn test_assign_deduplicates_vendor_list() {
    let lead = create_test_lead(LeadStatus::Pending);
    let transition = run(
        &lead,
        Command::Assign {
            vendor_ids: vec![5, 2, 5],
        },
        &LeadContext::new(ADMIN, now()),
    )
    .unwrap();

    assert_eq!(transition.new_lead.status, LeadStatus::Assigned);
    assert_eq!(transition.new_lead.assigned_vendor_ids, vec![2, 5]);
}

#[test]
fn test_assign_requires_vendors() {
    let lead = create_test_lead(LeadStatus::Available);
    let result = run(
        &lead,
        Command::Assign { vendor_ids: vec![] },
        &LeadContext::new(ADMIN, now()),
    );
    assert_eq!(
        result,
        Err(CoreError::DomainViolation(DomainError::EmptyAssignment))
    );
}

#[test]
fn test_publish_clears_assignment() {
    let mut lead = create_test_lead(LeadStatus::Assigned);
    lead.assigned_vendor_ids = vec![4];
    let transition = run(&lead, Command::Publish, &LeadContext::new(ADMIN, now())).unwrap();
    assert!(transition.new_lead.assigned_vendor_ids.is_empty());
}

#[test]
fn test_owner_advances_pipeline_with_notes() {
    let lead = create_taken_lead(3, LeadStatus::Taken);
    let transition = run(
        &lead,
        Command::Advance {
            to: LeadStatus::Contacted,
            notes: Some(String::from("  Left voicemail ")),
        },
        &LeadContext::new(vendor_authority(3), now()),
    )
    .unwrap();

    assert_eq!(transition.new_lead.status, LeadStatus::Contacted);
    assert_eq!(
        transition.status_change.notes.as_deref(),
        Some("Left voicemail")
    );
}

#[test]
fn test_non_owner_cannot_advance() {
    let lead = create_taken_lead(3, LeadStatus::Taken);
    let result = run(
        &lead,
        Command::Advance {
            to: LeadStatus::Contacted,
            notes: None,
        },
        &LeadContext::new(vendor_authority(4), now()),
    );
    assert!(matches!(result, Err(CoreError::Forbidden { .. })));
}

#[test]
fn test_advance_cannot_skip_steps() {
    let lead = create_taken_lead(3, LeadStatus::Contacted);
    let result = run(
        &lead,
        Command::Advance {
            to: LeadStatus::Completed,
            notes: None,
        },
        &LeadContext::new(vendor_authority(3), now()),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[test]
fn test_advance_cannot_request_refund() {
    let lead = create_taken_lead(3, LeadStatus::Taken);
    let result = run(
        &lead,
        Command::Advance {
            to: LeadStatus::RefundRequested,
            notes: None,
        },
        &LeadContext::new(vendor_authority(3), now()),
    );
    assert!(result.is_err());
}

#[test]
fn test_admin_can_drive_pipeline_to_conversion() {
    let mut lead = create_taken_lead(3, LeadStatus::Interested);
    for next in [
        LeadStatus::Scheduled,
        LeadStatus::InProgress,
        LeadStatus::Completed,
        LeadStatus::Converted,
    ] {
        lead = run(
            &lead,
            Command::Advance {
                to: next,
                notes: None,
            },
            &LeadContext::new(ADMIN, now()),
        )
        .unwrap()
        .new_lead;
    }
    assert_eq!(lead.status, LeadStatus::Converted);
    assert!(lead.status.is_terminal());
}

#[test]
fn test_advance_on_unowned_lead_is_rejected() {
    let lead = create_test_lead(LeadStatus::Available);
    let result = run(
        &lead,
        Command::Advance {
            to: LeadStatus::Taken,
            notes: None,
        },
        &LeadContext::new(ADMIN, now()),
    );
    assert!(result.is_err());
}

#[test]
fn test_admin_cancel_records_reason() {
    let lead = create_taken_lead(3, LeadStatus::Contacted);
    let transition = run(
        &lead,
        Command::Cancel {
            reason: String::from("Customer withdrew the request"),
        },
        &LeadContext::new(ADMIN, now()),
    )
    .unwrap();
    assert_eq!(transition.new_lead.status, LeadStatus::Cancelled);
    assert_eq!(
        transition.status_change.notes.as_deref(),
        Some("Customer withdrew the request")
    );
    assert_eq!(transition.quota, QuotaEffect::None);
}

#[test]
fn test_cancel_requires_reason_and_admin() {
    let lead = create_test_lead(LeadStatus::Pending);
    assert!(
        run(
            &lead,
            Command::Cancel {
                reason: String::from("  ")
            },
            &LeadContext::new(ADMIN, now()),
        )
        .is_err()
    );
    assert!(matches!(
        run(
            &lead,
            Command::Cancel {
                reason: String::from("spam")
            },
            &LeadContext::new(vendor_authority(3), now()),
        ),
        Err(CoreError::Forbidden { .. })
    ));
}

#[test]
fn test_cancel_terminal_lead_is_rejected() {
    let lead = create_taken_lead(3, LeadStatus::Converted);
    let result = run(
        &lead,
        Command::Cancel {
            reason: String::from("late"),
        },
        &LeadContext::new(ADMIN, now()),
    );
    assert!(result.is_err());
}

#[test]
fn test_reassign_moves_ownership_without_quota_change() {
    let lead = create_taken_lead(3, LeadStatus::Contacted);
    let new_owner = create_test_vendor(4, &[]);
    let transition = run(
        &lead,
        Command::Reassign { vendor_id: 4 },
        &LeadContext::new(ADMIN, now()).with_vendor(&new_owner),
    )
    .unwrap();

    assert_eq!(transition.new_lead.taken_by, Some(4));
    assert_eq!(transition.new_lead.status, LeadStatus::Contacted);
    assert_eq!(transition.new_lead.subscription_id, Some(50));
    assert_eq!(transition.new_lead.taken_at, lead.taken_at);
    assert_eq!(transition.quota, QuotaEffect::None);
    assert_eq!(
        transition.status_change.from_status,
        transition.status_change.to_status
    );
}

#[test]
fn test_reassign_to_inactive_vendor_is_rejected() {
    let lead = create_taken_lead(3, LeadStatus::Taken);
    let mut new_owner = create_test_vendor(4, &[]);
    new_owner.is_active = false;
    let result = run(
        &lead,
        Command::Reassign { vendor_id: 4 },
        &LeadContext::new(ADMIN, now()).with_vendor(&new_owner),
    );
    assert_eq!(
        result,
        Err(CoreError::DomainViolation(DomainError::VendorInactive(4)))
    );
}
