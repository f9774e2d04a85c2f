// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Timestamps are RFC 3339 strings and dates are `YYYY-MM-DD`.

use leadhub_domain::{
    Lead, Subscription, SubscriptionPlan, SupportTicket, TicketMessage, Vendor,
};
use leadhub_persistence::{
    AuditEntry, DashboardTotals, LeadHistoryData, LeadNoteData, OperatorData,
    VendorPipelineStats,
};
use time::OffsetDateTime;

// ============================================================================
// Paging
// ============================================================================

/// `?page=&per_page=` on list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// ============================================================================
// Leads
// ============================================================================

/// The public lead form.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SubmitLeadRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub category: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub budget_cents: Option<i64>,
    /// `YYYY-MM-DD`.
    pub preferred_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmitLeadResponse {
    pub lead_id: i64,
    pub status: String,
    pub message: String,
}

/// Full lead view for admins and the owning vendor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeadInfo {
    pub lead_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub category: String,
    pub location: String,
    pub description: String,
    pub budget_cents: Option<i64>,
    pub preferred_date: Option<String>,
    pub source: String,
    pub status: String,
    pub assigned_vendor_ids: Vec<i64>,
    pub taken_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub taken_at: Option<OffsetDateTime>,
    pub refund_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&Lead> for LeadInfo {
    fn from(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id_or_zero(),
            customer_name: lead.customer_name.clone(),
            customer_email: lead.customer_email.clone(),
            customer_phone: lead.customer_phone.clone(),
            category: lead.category.as_str().to_string(),
            location: lead.location.clone(),
            description: lead.description.clone(),
            budget_cents: lead.budget_cents,
            preferred_date: lead.preferred_date.map(|d| d.to_string()),
            source: lead.source.as_str().to_string(),
            status: lead.status.as_str().to_string(),
            assigned_vendor_ids: lead.assigned_vendor_ids.clone(),
            taken_by: lead.taken_by,
            taken_at: lead.taken_at,
            refund_reason: lead.refund_reason.clone(),
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

/// What a vendor sees before taking a lead. Contact details stay hidden
/// until the take succeeds.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AvailableLeadInfo {
    pub lead_id: i64,
    /// Given name only.
    pub customer_first_name: String,
    pub category: String,
    pub location: String,
    pub description: String,
    pub budget_cents: Option<i64>,
    pub preferred_date: Option<String>,
    pub status: String,
    /// True when the lead was assigned to this vendor directly.
    pub assigned_to_you: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AvailableLeadInfo {
    #[must_use]
    pub fn for_vendor(lead: &Lead, vendor_id: i64) -> Self {
        Self {
            lead_id: lead.id_or_zero(),
            customer_first_name: lead
                .customer_name
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
            category: lead.category.as_str().to_string(),
            location: lead.location.clone(),
            description: lead.description.clone(),
            budget_cents: lead.budget_cents,
            preferred_date: lead.preferred_date.map(|d| d.to_string()),
            status: lead.status.as_str().to_string(),
            assigned_to_you: lead.assigned_vendor_ids.contains(&vendor_id),
            created_at: lead.created_at,
        }
    }
}

/// Admin lead listing filters. All filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ListLeadsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub vendor_id: Option<i64>,
    /// Matches customer name, email or phone.
    pub search: Option<String>,
    /// RFC 3339.
    pub created_after: Option<String>,
    /// RFC 3339.
    pub created_before: Option<String>,
    /// `newest`, `oldest` or `updated`.
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Admin correction of lead details. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct UpdateLeadRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub budget_cents: Option<i64>,
    #[serde(default)]
    pub clear_budget: bool,
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub clear_preferred_date: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct AssignLeadRequest {
    pub vendor_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct ReassignLeadRequest {
    pub vendor_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CancelLeadRequest {
    pub reason: String,
}

/// Moves a lead along the sales pipeline.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct AdvanceLeadRequest {
    /// Target status, e.g. `contacted`.
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RefundRequest {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ResolveRefundRequest {
    pub approve: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct AddNoteRequest {
    pub body: String,
}

/// The lead after a lifecycle command.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeadTransitionResponse {
    pub lead: LeadInfo,
    pub event_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeadHistoryInfo {
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_by_operator_id: Option<i64>,
    pub notes: Option<String>,
    pub changed_at: String,
}

impl From<LeadHistoryData> for LeadHistoryInfo {
    fn from(row: LeadHistoryData) -> Self {
        Self {
            from_status: row.from_status,
            to_status: row.to_status,
            changed_by_operator_id: row.changed_by_operator_id,
            notes: row.notes,
            changed_at: row.changed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeadNoteInfo {
    pub note_id: i64,
    pub vendor_id: Option<i64>,
    pub author_operator_id: i64,
    pub body: String,
    pub created_at: String,
}

impl From<LeadNoteData> for LeadNoteInfo {
    fn from(row: LeadNoteData) -> Self {
        Self {
            note_id: row.note_id,
            vendor_id: row.vendor_id,
            author_operator_id: row.author_operator_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

/// A lead with its status history and notes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LeadDetailResponse {
    pub lead: LeadInfo,
    pub history: Vec<LeadHistoryInfo>,
    pub notes: Vec<LeadNoteInfo>,
}

/// Result of a write that has no richer payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EventResponse {
    pub event_id: i64,
    pub message: String,
}

// ============================================================================
// CSV lead import
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CsvImportRequest {
    pub csv_content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvRowStatus {
    Valid,
    Invalid,
    /// Same email and category as an earlier row in the file.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CsvPreviewRow {
    /// 1-based data row number; the header row is not counted.
    pub row_number: usize,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub budget_cents: Option<i64>,
    pub status: CsvRowStatus,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CsvPreviewResponse {
    pub rows: Vec<CsvPreviewRow>,
    pub total_rows: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CsvImportResponse {
    pub lead_ids: Vec<i64>,
    pub imported_count: usize,
    pub event_id: i64,
}

// ============================================================================
// Vendors and operators
// ============================================================================

/// Creates a vendor business and its first login together.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CreateVendorRequest {
    pub business_name: String,
    pub contact_email: String,
    pub phone: String,
    /// Empty means every category.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub service_areas: String,
    pub login_name: String,
    pub display_name: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VendorInfo {
    pub vendor_id: i64,
    pub business_name: String,
    pub contact_email: String,
    pub phone: String,
    pub categories: Vec<String>,
    pub service_areas: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Vendor> for VendorInfo {
    fn from(vendor: &Vendor) -> Self {
        Self {
            vendor_id: vendor.vendor_id.unwrap_or_default(),
            business_name: vendor.business_name.clone(),
            contact_email: vendor.contact_email.clone(),
            phone: vendor.phone.clone(),
            categories: vendor
                .categories
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            service_areas: vendor.service_areas.clone(),
            is_active: vendor.is_active,
            created_at: vendor.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateVendorResponse {
    pub vendor: VendorInfo,
    pub operator_id: i64,
    pub event_id: i64,
}

/// Profile changes. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct UpdateVendorRequest {
    pub business_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub categories: Option<Vec<String>>,
    pub service_areas: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct SetVendorActiveRequest {
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VendorResponse {
    pub vendor: VendorInfo,
    pub event_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ListVendorsQuery {
    pub search: Option<String>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperatorInfo {
    pub operator_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub role: String,
    pub is_disabled: bool,
    pub last_login_at: Option<String>,
}

impl From<OperatorData> for OperatorInfo {
    fn from(operator: OperatorData) -> Self {
        Self {
            operator_id: operator.operator_id,
            login_name: operator.login_name,
            display_name: operator.display_name,
            role: operator.role,
            is_disabled: operator.is_disabled,
            last_login_at: operator.last_login_at,
        }
    }
}

/// Admin view of one vendor.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VendorDetailResponse {
    pub vendor: VendorInfo,
    pub subscription: Option<SubscriptionInfo>,
    pub pipeline: VendorPipelineStats,
    pub operators: Vec<OperatorInfo>,
}

// ============================================================================
// Plans and subscriptions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlanInfo {
    pub plan_id: i64,
    pub name: String,
    pub description: String,
    pub lead_quota: i64,
    pub duration_days: i64,
    pub price_cents: i64,
    pub is_active: bool,
}

impl From<&SubscriptionPlan> for PlanInfo {
    fn from(plan: &SubscriptionPlan) -> Self {
        Self {
            plan_id: plan.plan_id.unwrap_or_default(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            lead_quota: plan.lead_quota,
            duration_days: plan.duration_days,
            price_cents: plan.price_cents,
            is_active: plan.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub lead_quota: i64,
    pub duration_days: i64,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct UpdatePlanRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub lead_quota: Option<i64>,
    pub duration_days: Option<i64>,
    pub price_cents: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListPlansResponse {
    pub plans: Vec<PlanInfo>,
}

/// A subscription with its status as of the request time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubscriptionInfo {
    pub subscription_id: i64,
    pub vendor_id: i64,
    pub plan_id: i64,
    pub lead_quota: i64,
    pub leads_used: i64,
    pub remaining: i64,
    /// Expiry and exhaustion are reflected here even before any write.
    pub status: String,
    pub payment_reference: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

impl SubscriptionInfo {
    #[must_use]
    pub fn at(subscription: &Subscription, now: OffsetDateTime) -> Self {
        Self {
            subscription_id: subscription.subscription_id.unwrap_or_default(),
            vendor_id: subscription.vendor_id,
            plan_id: subscription.plan_id,
            lead_quota: subscription.lead_quota,
            leads_used: subscription.leads_used,
            remaining: subscription.remaining(),
            status: subscription.effective_status(now).as_str().to_string(),
            payment_reference: subscription.payment_reference.clone(),
            starts_at: subscription.starts_at,
            ends_at: subscription.ends_at,
        }
    }
}

/// Admin grant of a plan to a vendor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct GrantSubscriptionRequest {
    pub plan_id: i64,
    pub payment_reference: Option<String>,
}

/// Vendor self-service purchase.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct PurchaseRequest {
    pub plan_id: i64,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubscriptionResponse {
    pub subscription: SubscriptionInfo,
    pub event_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VendorSubscriptionsResponse {
    pub current: Option<SubscriptionInfo>,
    /// Newest first.
    pub history: Vec<SubscriptionInfo>,
}

// ============================================================================
// Support tickets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct OpenTicketRequest {
    pub subject: String,
    pub category: String,
    /// Defaults to `medium`.
    pub priority: Option<String>,
    pub lead_id: Option<i64>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TicketInfo {
    pub ticket_id: i64,
    pub vendor_id: i64,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<i64>,
    pub lead_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&SupportTicket> for TicketInfo {
    fn from(ticket: &SupportTicket) -> Self {
        Self {
            ticket_id: ticket.id_or_zero(),
            vendor_id: ticket.vendor_id,
            subject: ticket.subject.clone(),
            category: ticket.category.as_str().to_string(),
            priority: ticket.priority.as_str().to_string(),
            status: ticket.status.as_str().to_string(),
            assigned_to: ticket.assigned_to,
            lead_id: ticket.lead_id,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TicketMessageInfo {
    pub message_id: i64,
    pub author_operator_id: i64,
    /// `admin` or `vendor`.
    pub author: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&TicketMessage> for TicketMessageInfo {
    fn from(message: &TicketMessage) -> Self {
        Self {
            message_id: message.message_id.unwrap_or_default(),
            author_operator_id: message.author_operator_id,
            author: message.author.as_str().to_string(),
            body: message.body.clone(),
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TicketDetailResponse {
    pub ticket: TicketInfo,
    pub messages: Vec<TicketMessageInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TicketResponse {
    pub ticket: TicketInfo,
    pub event_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ReplyTicketRequest {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SetTicketStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct AssignTicketRequest {
    pub operator_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ListTicketsQuery {
    /// Ignored for vendors, who only see their own tickets.
    pub vendor_id: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DashboardResponse {
    pub totals: DashboardTotals,
    pub leads_by_status: Vec<StatusCount>,
    pub vendors: Vec<VendorPipelineStats>,
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct LoginRequest {
    pub login_name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub operator_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub role: String,
    pub vendor_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WhoAmIResponse {
    pub operator_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub role: String,
    pub vendor_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Audit
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditEventInfo {
    pub event_id: i64,
    pub actor_type: String,
    pub actor_id: String,
    pub operator_login_name: Option<String>,
    pub action: String,
    pub details: Option<String>,
    pub subject_kind: String,
    pub subject_id: Option<i64>,
    pub before: String,
    pub after: String,
    pub created_at: String,
}

impl From<AuditEntry> for AuditEventInfo {
    fn from(entry: AuditEntry) -> Self {
        let event = entry.event;
        Self {
            event_id: event.event_id.unwrap_or_default(),
            actor_type: event.actor.actor_type,
            actor_id: event.actor.id,
            operator_login_name: event.actor.operator_login_name,
            action: event.action.name,
            details: event.action.details,
            subject_kind: event.subject.kind().to_string(),
            subject_id: event.subject.id(),
            before: event.before.data,
            after: event.after.data,
            created_at: entry.created_at,
        }
    }
}
