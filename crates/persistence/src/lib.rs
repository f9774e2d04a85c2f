// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the LeadHub marketplace.
//!
//! This crate stores leads, vendors, subscriptions, support tickets,
//! operators and the audit trail in `SQLite` through Diesel. The schema is
//! managed by embedded migrations applied on every open.
//!
//! ## Connections
//!
//! - [`Persistence::new_in_memory`] opens a private shared-cache in-memory
//!   database. Each call gets its own database, which keeps tests isolated.
//! - [`Persistence::new_with_file`] opens a file-backed database in WAL
//!   mode.
//!
//! Both verify that foreign key enforcement is active before returning.
//!
//! ## Concurrency
//!
//! Writes that must land together run in `BEGIN IMMEDIATE` transactions.
//! Taking a lead is a compare-and-set on the lead row plus a conditional
//! quota increment on the subscription, both in one transaction; a lost
//! race surfaces as [`PersistenceError::LeadTakeConflict`] and an empty
//! quota as [`PersistenceError::QuotaUnavailable`], with nothing written.
//!
//! ## Testing Philosophy
//!
//! - Tests run against fresh in-memory databases
//! - Every test creates exactly the rows it needs

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use leadhub::{LeadTransition, SubscriptionTransition, TicketTransition};
use leadhub_audit::{AuditEvent, AuditSubject};
use leadhub_domain::{
    Lead, LeadFilter, Page, PageRequest, Subscription, SubscriptionPlan, SupportTicket,
    TicketMessage, Vendor,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod timestamps;

#[cfg(test)]
mod tests;

pub use data_models::{
    AuditEntry, DashboardTotals, LeadHistoryData, LeadNoteData, NewOperator, OperatorData,
    SessionData, TicketFilter, VendorPipelineStats,
};
pub use error::PersistenceError;
pub use mutations::operators::normalize_login;
pub use mutations::vendors::CreatedVendorAccount;
pub use queries::operators::verify_password;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Type alias kept for callers that name the backend explicitly.
pub type SqlitePersistence = Persistence;

/// Persistence adapter over one `SQLite` connection.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    /// Lists the application tables present in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tables(&mut self) -> Result<Vec<String>, PersistenceError> {
        backend::sqlite::list_tables(&mut self.conn)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Persists a standalone audit event (operator management, plans).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn persist_audit_event(
        &mut self,
        event: &AuditEvent,
        at: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event, at)
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist or cannot be decoded.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEntry, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Returns the audit trail of one record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_audit_events_for_subject(
        &mut self,
        subject: AuditSubject,
    ) -> Result<Vec<AuditEntry>, PersistenceError> {
        queries::audit::list_audit_events_for_subject(&mut self.conn, subject)
    }

    /// Returns the most recent audit events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_recent_audit_events(
        &mut self,
        limit: i64,
    ) -> Result<Vec<AuditEntry>, PersistenceError> {
        queries::audit::list_recent_audit_events(&mut self.conn, limit)
    }

    // ========================================================================
    // Operators and sessions
    // ========================================================================

    /// Creates an operator. `vendor_id` must be set exactly when `role` is
    /// `Vendor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the login name exists or the insert fails.
    pub fn create_operator(
        &mut self,
        operator: NewOperator<'_>,
        role: &str,
        vendor_id: Option<i64>,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::operators::create_operator(&mut self.conn, operator, role, vendor_id, now)
    }

    /// Retrieves an operator by login name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_operator_by_login(
        &mut self,
        login_name: &str,
    ) -> Result<Option<OperatorData>, PersistenceError> {
        queries::operators::get_operator_by_login(&mut self.conn, login_name)
    }

    /// Retrieves an operator by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_operator_by_id(
        &mut self,
        operator_id: i64,
    ) -> Result<Option<OperatorData>, PersistenceError> {
        queries::operators::get_operator_by_id(&mut self.conn, operator_id)
    }

    /// Lists the operators bound to a vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_vendor_operators(
        &mut self,
        vendor_id: i64,
    ) -> Result<Vec<OperatorData>, PersistenceError> {
        queries::operators::list_vendor_operators(&mut self.conn, vendor_id)
    }

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_operators(&mut self) -> Result<i64, PersistenceError> {
        queries::operators::count_operators(&mut self.conn)
    }

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_active_admin_operators(&mut self) -> Result<i64, PersistenceError> {
        queries::operators::count_active_admin_operators(&mut self.conn)
    }

    /// # Errors
    ///
    /// Returns an error if the database cannot be updated.
    pub fn update_last_login(
        &mut self,
        operator_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::operators::update_last_login(&mut self.conn, operator_id, now)
    }

    /// Replaces an operator's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator does not exist or hashing fails.
    pub fn update_password(
        &mut self,
        operator_id: i64,
        new_password: &str,
    ) -> Result<(), PersistenceError> {
        mutations::operators::update_password(&mut self.conn, operator_id, new_password)
    }

    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_session(
        &mut self,
        session_token: &str,
        operator_id: i64,
        now: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::operators::create_session(
            &mut self.conn,
            session_token,
            operator_id,
            now,
            expires_at,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::operators::get_session_by_token(&mut self.conn, session_token)
    }

    /// # Errors
    ///
    /// Returns an error if the database cannot be updated.
    pub fn update_session_activity(
        &mut self,
        session_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::operators::update_session_activity(&mut self.conn, session_id, now)
    }

    /// # Errors
    ///
    /// Returns an error if the database cannot be updated.
    pub fn delete_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::operators::delete_session(&mut self.conn, session_token)
    }

    /// Deletes sessions that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be updated.
    pub fn delete_expired_sessions(&mut self, now: OffsetDateTime) -> Result<usize, PersistenceError> {
        mutations::operators::delete_expired_sessions(&mut self.conn, now)
    }

    /// # Errors
    ///
    /// Returns an error if the database cannot be updated.
    pub fn delete_sessions_for_operator(
        &mut self,
        operator_id: i64,
    ) -> Result<usize, PersistenceError> {
        mutations::operators::delete_sessions_for_operator(&mut self.conn, operator_id)
    }

    // ========================================================================
    // Vendors
    // ========================================================================

    /// Creates a vendor and its first operator login together.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or login is taken.
    pub fn create_vendor_account(
        &mut self,
        vendor: &Vendor,
        operator: NewOperator<'_>,
        event: &AuditEvent,
    ) -> Result<CreatedVendorAccount, PersistenceError> {
        mutations::vendors::create_vendor_account(&mut self.conn, vendor, operator, event)
    }

    /// Saves a vendor's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor does not exist or a write fails.
    pub fn update_vendor(
        &mut self,
        vendor: &Vendor,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::vendors::update_vendor(&mut self.conn, vendor, event, now)
    }

    /// Activates or deactivates a vendor and its operators.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor does not exist or a write fails.
    pub fn set_vendor_active(
        &mut self,
        vendor_id: i64,
        active: bool,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::vendors::set_vendor_active(&mut self.conn, vendor_id, active, event, now)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_vendor(&mut self, vendor_id: i64) -> Result<Option<Vendor>, PersistenceError> {
        queries::vendors::get_vendor(&mut self.conn, vendor_id)
    }

    /// Lists vendors by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_vendors(
        &mut self,
        search: Option<&str>,
        active: Option<bool>,
        request: PageRequest,
    ) -> Result<Page<Vendor>, PersistenceError> {
        queries::vendors::list_vendors(&mut self.conn, search, active, request)
    }

    // ========================================================================
    // Leads
    // ========================================================================

    /// Inserts a new lead. Returns `(lead_id, event_id)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub fn insert_lead(
        &mut self,
        lead: &Lead,
        event: &AuditEvent,
        changed_by_operator_id: Option<i64>,
    ) -> Result<(i64, i64), PersistenceError> {
        mutations::leads::insert_lead(&mut self.conn, lead, event, changed_by_operator_id)
    }

    /// Inserts a batch of imported leads atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is written in that case.
    pub fn insert_leads(
        &mut self,
        leads: &[Lead],
        event: &AuditEvent,
        changed_by_operator_id: Option<i64>,
        now: OffsetDateTime,
    ) -> Result<(Vec<i64>, i64), PersistenceError> {
        mutations::leads::insert_leads(&mut self.conn, leads, event, changed_by_operator_id, now)
    }

    /// Saves edited lead details.
    ///
    /// # Errors
    ///
    /// Returns an error if the lead does not exist or a write fails.
    pub fn persist_lead_update(
        &mut self,
        lead: &Lead,
        event: &AuditEvent,
    ) -> Result<i64, PersistenceError> {
        mutations::leads::persist_lead_update(&mut self.conn, lead, event)
    }

    /// Deletes an untaken lead.
    ///
    /// # Errors
    ///
    /// Returns `StaleRecord` if the lead has been taken.
    pub fn delete_lead(
        &mut self,
        lead_id: i64,
        event: &AuditEvent,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::leads::delete_lead(&mut self.conn, lead_id, event, now)
    }

    /// Claims a lead and consumes quota in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `LeadTakeConflict` or `QuotaUnavailable` when the claim
    /// cannot be made; nothing is written in either case.
    pub fn take_lead(&mut self, transition: &LeadTransition) -> Result<i64, PersistenceError> {
        mutations::leads::take_lead(&mut self.conn, transition)
    }

    /// Persists any lead transition. Returns the audit event id.
    ///
    /// # Errors
    ///
    /// Returns `StaleRecord` if the lead changed concurrently, or any
    /// error from [`Persistence::take_lead`].
    pub fn persist_lead_transition(
        &mut self,
        transition: &LeadTransition,
    ) -> Result<i64, PersistenceError> {
        mutations::leads::persist_lead_transition(&mut self.conn, transition)
    }

    /// # Errors
    ///
    /// Returns an error if the lead or author does not exist.
    pub fn add_lead_note(
        &mut self,
        lead_id: i64,
        vendor_id: Option<i64>,
        author_operator_id: i64,
        body: &str,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::leads::add_lead_note(
            &mut self.conn,
            lead_id,
            vendor_id,
            author_operator_id,
            body,
            now,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_lead(&mut self, lead_id: i64) -> Result<Option<Lead>, PersistenceError> {
        queries::leads::get_lead(&mut self.conn, lead_id)
    }

    /// Lists leads matching a filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_leads(
        &mut self,
        filter: &LeadFilter,
        request: PageRequest,
    ) -> Result<Page<Lead>, PersistenceError> {
        queries::leads::list_leads(&mut self.conn, filter, request)
    }

    /// Lists leads the vendor could take now.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_available_leads(
        &mut self,
        vendor: &Vendor,
        request: PageRequest,
    ) -> Result<Page<Lead>, PersistenceError> {
        queries::leads::list_available_leads(&mut self.conn, vendor, request)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_lead_history(
        &mut self,
        lead_id: i64,
    ) -> Result<Vec<LeadHistoryData>, PersistenceError> {
        queries::leads::get_lead_history(&mut self.conn, lead_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_lead_notes(&mut self, lead_id: i64) -> Result<Vec<LeadNoteData>, PersistenceError> {
        queries::leads::list_lead_notes(&mut self.conn, lead_id)
    }

    // ========================================================================
    // Plans and subscriptions
    // ========================================================================

    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_plan(&mut self, plan: &SubscriptionPlan) -> Result<i64, PersistenceError> {
        mutations::subscriptions::create_plan(&mut self.conn, plan)
    }

    /// # Errors
    ///
    /// Returns an error if the plan does not exist.
    pub fn update_plan(&mut self, plan: &SubscriptionPlan) -> Result<(), PersistenceError> {
        mutations::subscriptions::update_plan(&mut self.conn, plan)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_plan(&mut self, plan_id: i64) -> Result<Option<SubscriptionPlan>, PersistenceError> {
        queries::subscriptions::get_plan(&mut self.conn, plan_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_plans(&mut self, active_only: bool) -> Result<Vec<SubscriptionPlan>, PersistenceError> {
        queries::subscriptions::list_plans(&mut self.conn, active_only)
    }

    /// Inserts a purchased or granted subscription. Returns
    /// `(subscription_id, event_id)`.
    ///
    /// # Errors
    ///
    /// Returns `StaleRecord` if another active subscription appeared.
    pub fn insert_subscription(
        &mut self,
        transition: &SubscriptionTransition,
    ) -> Result<(i64, i64), PersistenceError> {
        mutations::subscriptions::insert_subscription(&mut self.conn, transition)
    }

    /// # Errors
    ///
    /// Returns an error if the subscription does not exist.
    pub fn persist_subscription_update(
        &mut self,
        transition: &SubscriptionTransition,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::subscriptions::persist_subscription_update(&mut self.conn, transition, now)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_subscription(
        &mut self,
        subscription_id: i64,
    ) -> Result<Option<Subscription>, PersistenceError> {
        queries::subscriptions::get_subscription(&mut self.conn, subscription_id)
    }

    /// Returns the vendor's most recent subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_latest_subscription(
        &mut self,
        vendor_id: i64,
    ) -> Result<Option<Subscription>, PersistenceError> {
        queries::subscriptions::get_latest_subscription(&mut self.conn, vendor_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_vendor_subscriptions(
        &mut self,
        vendor_id: i64,
    ) -> Result<Vec<Subscription>, PersistenceError> {
        queries::subscriptions::list_vendor_subscriptions(&mut self.conn, vendor_id)
    }

    // ========================================================================
    // Support tickets
    // ========================================================================

    /// Inserts a newly opened ticket. Returns `(ticket_id, event_id)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub fn insert_ticket(
        &mut self,
        transition: &TicketTransition,
    ) -> Result<(i64, i64), PersistenceError> {
        mutations::tickets::insert_ticket(&mut self.conn, transition)
    }

    /// # Errors
    ///
    /// Returns an error if the ticket does not exist.
    pub fn persist_ticket_transition(
        &mut self,
        transition: &TicketTransition,
    ) -> Result<i64, PersistenceError> {
        mutations::tickets::persist_ticket_transition(&mut self.conn, transition)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_ticket(&mut self, ticket_id: i64) -> Result<Option<SupportTicket>, PersistenceError> {
        queries::tickets::get_ticket(&mut self.conn, ticket_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_tickets(
        &mut self,
        filter: &TicketFilter,
        request: PageRequest,
    ) -> Result<Page<SupportTicket>, PersistenceError> {
        queries::tickets::list_tickets(&mut self.conn, filter, request)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_ticket_messages(
        &mut self,
        ticket_id: i64,
    ) -> Result<Vec<TicketMessage>, PersistenceError> {
        queries::tickets::list_ticket_messages(&mut self.conn, ticket_id)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_leads_by_status(&mut self) -> Result<Vec<(String, i64)>, PersistenceError> {
        queries::stats::count_leads_by_status(&mut self.conn)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn vendor_pipeline_stats(
        &mut self,
        vendor_id: i64,
    ) -> Result<VendorPipelineStats, PersistenceError> {
        queries::stats::vendor_pipeline_stats(&mut self.conn, vendor_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn all_vendor_pipeline_stats(
        &mut self,
    ) -> Result<Vec<VendorPipelineStats>, PersistenceError> {
        queries::stats::all_vendor_pipeline_stats(&mut self.conn)
    }

    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn dashboard_totals(&mut self, now: OffsetDateTime) -> Result<DashboardTotals, PersistenceError> {
        queries::stats::dashboard_totals(&mut self.conn, now)
    }
}
