// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

#[cfg(test)]
mod tests;

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change: an
/// admin, a vendor operator, an anonymous customer or the system itself.
/// Operator fields are populated whenever the actor is a logged-in operator
/// so the audit trail survives later renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (`admin`, `vendor`, `customer`, `system`).
    pub actor_type: String,
    /// The operator's database id, if the actor is an operator.
    pub operator_id: Option<i64>,
    /// The operator's login name at the time of the action.
    pub operator_login_name: Option<String>,
    /// The operator's display name at the time of the action.
    pub operator_display_name: Option<String>,
}

impl Actor {
    /// Creates a new Actor that is not tied to an operator account.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self {
            id,
            actor_type,
            operator_id: None,
            operator_login_name: None,
            operator_display_name: None,
        }
    }

    /// Creates an Actor for a logged-in operator.
    #[must_use]
    pub const fn with_operator(
        id: String,
        actor_type: String,
        operator_id: i64,
        operator_login_name: String,
        operator_display_name: String,
    ) -> Self {
        Self {
            id,
            actor_type,
            operator_id: Some(operator_id),
            operator_login_name: Some(operator_login_name),
            operator_display_name: Some(operator_display_name),
        }
    }

    /// The actor used for unauthenticated customer submissions.
    #[must_use]
    pub fn customer() -> Self {
        Self::new(String::from("public"), String::from("customer"))
    }

    /// The actor used for actions the server takes on its own behalf.
    #[must_use]
    pub fn system() -> Self {
        Self::new(String::from("system"), String::from("system"))
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`TakeLead`", "`ResolveRefund`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A compact textual snapshot of the audited record before or after
/// a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub data: String,
}

impl StateSnapshot {
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// The record an audit event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditSubject {
    Lead(i64),
    Ticket(i64),
    Subscription(i64),
    Vendor(i64),
    /// Events not tied to a single record (operator management, plans, imports).
    Global,
}

impl AuditSubject {
    /// Returns the subject kind as stored in the database.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Lead(_) => "lead",
            Self::Ticket(_) => "ticket",
            Self::Subscription(_) => "subscription",
            Self::Vendor(_) => "vendor",
            Self::Global => "global",
        }
    }

    /// Returns the subject id, or `None` for global events.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        match self {
            Self::Lead(id) | Self::Ticket(id) | Self::Subscription(id) | Self::Vendor(id) => {
                Some(*id)
            }
            Self::Global => None,
        }
    }

    /// Rebuilds a subject from its stored kind and id.
    ///
    /// Unknown kinds, and scoped kinds missing an id, map to `Global`.
    #[must_use]
    pub fn from_parts(kind: &str, id: Option<i64>) -> Self {
        match (kind, id) {
            ("lead", Some(id)) => Self::Lead(id),
            ("ticket", Some(id)) => Self::Ticket(id),
            ("subscription", Some(id)) => Self::Subscription(id),
            ("vendor", Some(id)) => Self::Vendor(id),
            _ => Self::Global,
        }
    }
}

/// An immutable audit event representing a state transition.
///
/// Every successful state change must produce exactly one audit event.
/// Audit events are immutable once created and capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - The state before and after the transition
/// - Which record the transition applied to (subject)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The database id; `None` until persisted.
    pub event_id: Option<i64>,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
    pub subject: AuditSubject,
}

impl AuditEvent {
    /// Creates a new `AuditEvent`.
    ///
    /// Once created, an audit event is immutable.
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
        subject: AuditSubject,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            before,
            after,
            subject,
        }
    }

    /// Returns a copy carrying the id assigned by the database.
    #[must_use]
    pub const fn with_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }
}
