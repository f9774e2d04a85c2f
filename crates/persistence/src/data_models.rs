// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use leadhub_audit::AuditEvent;
use serde::{Deserialize, Serialize};

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

/// A stored audit event with the time it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub event: AuditEvent,
    pub created_at: String,
}

/// A login account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorData {
    pub operator_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub password_hash: String,
    /// `Admin` or `Vendor`.
    pub role: String,
    /// Set for vendor operators.
    pub vendor_id: Option<i64>,
    pub is_disabled: bool,
    pub created_at: String,
    pub disabled_at: Option<String>,
    pub last_login_at: Option<String>,
}

/// A login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub operator_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// A new login account. The password is hashed before storage.
#[derive(Debug, Clone, Copy)]
pub struct NewOperator<'a> {
    pub login_name: &'a str,
    pub display_name: &'a str,
    pub password: &'a str,
}

/// One row of a lead's status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadHistoryData {
    pub history_id: i64,
    pub lead_id: i64,
    /// `None` for the row written when the lead was created.
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_by_operator_id: Option<i64>,
    pub notes: Option<String>,
    pub changed_at: String,
}

/// A free-text note on a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadNoteData {
    pub note_id: i64,
    pub lead_id: i64,
    pub vendor_id: Option<i64>,
    pub author_operator_id: i64,
    pub body: String,
    pub created_at: String,
}

/// Filters for ticket listings. Filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub vendor_id: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<i64>,
}

/// Lead counts for one vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorPipelineStats {
    pub vendor_id: i64,
    /// Leads the vendor currently owns, in any status.
    pub total_taken: i64,
    /// Counts keyed by status, sorted by status name.
    pub by_status: Vec<(String, i64)>,
    pub converted: i64,
    /// `converted / total_taken`, or 0 when nothing was taken.
    pub conversion_rate: f64,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardTotals {
    pub total_leads: i64,
    pub pending_leads: i64,
    pub open_leads: i64,
    pub taken_leads: i64,
    pub converted_leads: i64,
    pub refund_requests: i64,
    pub leads_last_30_days: i64,
    pub active_vendors: i64,
    pub active_subscriptions: i64,
    pub open_tickets: i64,
}
