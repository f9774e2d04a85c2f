// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, Cause, StateSnapshot};

use crate::data_models::{ActionData, ActorData, AuditEntry, CauseData, StateSnapshotData};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Diesel Queryable struct for full audit event rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventRow {
    event_id: i64,
    subject_kind: String,
    subject_id: Option<i64>,
    actor_operator_id: Option<i64>,
    actor_login_name: String,
    actor_display_name: String,
    actor_json: String,
    cause_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
    created_at: String,
}

impl TryFrom<AuditEventRow> for AuditEntry {
    type Error = PersistenceError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        let actor_data: ActorData = serde_json::from_str(&row.actor_json)?;
        let cause_data: CauseData = serde_json::from_str(&row.cause_json)?;
        let action_data: ActionData = serde_json::from_str(&row.action_json)?;
        let before_data: StateSnapshotData = serde_json::from_str(&row.before_snapshot_json)?;
        let after_data: StateSnapshotData = serde_json::from_str(&row.after_snapshot_json)?;

        // Operator columns hold the names as they were when the event happened.
        let actor: Actor = match row.actor_operator_id {
            Some(operator_id) => Actor::with_operator(
                actor_data.id,
                actor_data.actor_type,
                operator_id,
                row.actor_login_name,
                row.actor_display_name,
            ),
            None => Actor::new(actor_data.id, actor_data.actor_type),
        };

        let event: AuditEvent = AuditEvent::new(
            actor,
            Cause::new(cause_data.id, cause_data.description),
            Action::new(action_data.name, action_data.details),
            StateSnapshot::new(before_data.data),
            StateSnapshot::new(after_data.data),
            AuditSubject::from_parts(&row.subject_kind, row.subject_id),
        )
        .with_event_id(row.event_id);

        Ok(Self {
            event,
            created_at: row.created_at,
        })
    }
}

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns `EventNotFound` if there is no such event, or an error if the
/// stored JSON cannot be deserialized.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEntry, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(PersistenceError::EventNotFound(event_id))?;
    AuditEntry::try_from(row)
}

/// Returns the audit trail of one record, oldest first.
///
/// # Errors
///
/// Returns an error if the query or deserialization fails.
pub fn list_audit_events_for_subject(
    conn: &mut SqliteConnection,
    subject: AuditSubject,
) -> Result<Vec<AuditEntry>, PersistenceError> {
    let mut query = audit_events::table
        .filter(audit_events::subject_kind.eq(subject.kind()))
        .select(AuditEventRow::as_select())
        .order_by(audit_events::event_id.asc())
        .into_boxed();
    query = match subject.id() {
        Some(id) => query.filter(audit_events::subject_id.eq(id)),
        None => query.filter(audit_events::subject_id.is_null()),
    };

    let rows: Vec<AuditEventRow> = query.load(conn)?;
    rows.into_iter().map(AuditEntry::try_from).collect()
}

/// Returns the most recent audit events across all subjects, newest first.
///
/// # Errors
///
/// Returns an error if the query or deserialization fails.
pub fn list_recent_audit_events(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<AuditEntry>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .select(AuditEventRow::as_select())
        .order_by(audit_events::event_id.desc())
        .limit(limit)
        .load(conn)?;
    rows.into_iter().map(AuditEntry::try_from).collect()
}
