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
#![allow(clippy::multiple_crate_versions)]

mod handlers;
mod live;
mod session;

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use clap::Parser;
use leadhub_api::{ApiError, bootstrap_admin};
use leadhub_audit::Cause;
use leadhub_persistence::SqlitePersistence;
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::live::{LiveEventBroadcaster, live_events_handler};

/// LeadHub Server - HTTP server for the LeadHub services marketplace
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "LEADHUB_DATABASE")]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, env = "LEADHUB_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, env = "LEADHUB_PORT", default_value_t = 3000)]
    port: u16,

    /// How long a login session lasts, in days
    #[arg(
        long,
        env = "LEADHUB_SESSION_DAYS",
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(1..=365)
    )]
    session_days: i64,

    /// Login name for the first admin, created only when no operators exist
    #[arg(long, env = "LEADHUB_ADMIN_LOGIN")]
    admin_login: Option<String>,

    /// Password for the first admin
    #[arg(long, env = "LEADHUB_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

/// Application state shared across handlers.
///
/// The `SQLite` connection sits behind a single async mutex; every API call
/// runs its whole read-check-write sequence while holding it.
#[derive(Clone)]
struct AppState {
    persistence: Arc<Mutex<SqlitePersistence>>,
    live: Arc<LiveEventBroadcaster>,
    session_length: Duration,
    /// Seeds the per-request cause ids written to the audit log.
    started_at: i64,
    requests: Arc<AtomicU64>,
}

impl AppState {
    fn new(persistence: SqlitePersistence, session_length: Duration) -> Self {
        Self {
            persistence: Arc::new(Mutex::new(persistence)),
            live: Arc::new(LiveEventBroadcaster::new()),
            session_length,
            started_at: OffsetDateTime::now_utc().unix_timestamp(),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A fresh audit cause for one HTTP request.
    fn cause(&self, description: &str) -> Cause {
        let sequence: u64 = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        Cause::new(
            format!("http-{}-{sequence}", self.started_at),
            description.to_string(),
        )
    }
}

impl FromRef<AppState> for Arc<LiveEventBroadcaster> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.live)
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Always `true`.
    error: bool,
    /// Human-readable reason.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidInput { .. }
            | ApiError::InvalidCsvFormat { .. }
            | ApiError::PasswordPolicyViolation { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    use handlers::{leads, portal, public, tickets, vendors};

    Router::new()
        // Anonymous
        .route("/api/public/leads", post(public::handle_submit_lead))
        .route("/api/public/plans", get(public::handle_list_public_plans))
        .route("/api/session/login", post(public::handle_login))
        // Any signed-in operator
        .route("/api/session/logout", post(public::handle_logout))
        .route("/api/session/whoami", get(public::handle_whoami))
        .route("/api/session/password", post(public::handle_change_password))
        .route(
            "/api/tickets",
            get(tickets::handle_list_tickets).post(tickets::handle_open_ticket),
        )
        .route("/api/tickets/{ticket_id}", get(tickets::handle_get_ticket))
        .route("/api/tickets/{ticket_id}/reply", post(tickets::handle_reply_ticket))
        .route("/api/tickets/{ticket_id}/status", post(tickets::handle_set_ticket_status))
        .route("/api/tickets/{ticket_id}/assign", post(tickets::handle_assign_ticket))
        .route("/api/tickets/{ticket_id}/close", post(tickets::handle_close_ticket))
        // Admin
        .route(
            "/api/admin/leads",
            get(leads::handle_list_leads).post(leads::handle_create_lead),
        )
        .route("/api/admin/leads/import/preview", post(leads::handle_preview_import))
        .route("/api/admin/leads/import", post(leads::handle_import_leads))
        .route(
            "/api/admin/leads/{lead_id}",
            get(leads::handle_get_lead)
                .patch(leads::handle_update_lead)
                .delete(leads::handle_delete_lead),
        )
        .route("/api/admin/leads/{lead_id}/publish", post(leads::handle_publish_lead))
        .route("/api/admin/leads/{lead_id}/assign", post(leads::handle_assign_lead))
        .route("/api/admin/leads/{lead_id}/reassign", post(leads::handle_reassign_lead))
        .route("/api/admin/leads/{lead_id}/cancel", post(leads::handle_cancel_lead))
        .route("/api/admin/leads/{lead_id}/advance", post(leads::handle_advance_lead))
        .route("/api/admin/leads/{lead_id}/refund", post(leads::handle_resolve_refund))
        .route("/api/admin/leads/{lead_id}/audit", get(leads::handle_lead_audit_trail))
        .route("/api/admin/audit", get(leads::handle_recent_audit_events))
        .route(
            "/api/admin/vendors",
            get(vendors::handle_list_vendors).post(vendors::handle_create_vendor),
        )
        .route(
            "/api/admin/vendors/{vendor_id}",
            get(vendors::handle_get_vendor).patch(vendors::handle_update_vendor),
        )
        .route(
            "/api/admin/vendors/{vendor_id}/active",
            post(vendors::handle_set_vendor_active),
        )
        .route(
            "/api/admin/vendors/{vendor_id}/subscriptions",
            get(vendors::handle_vendor_subscriptions).post(vendors::handle_grant_subscription),
        )
        .route(
            "/api/admin/plans",
            get(vendors::handle_list_all_plans).post(vendors::handle_create_plan),
        )
        .route("/api/admin/plans/{plan_id}", patch(vendors::handle_update_plan))
        .route(
            "/api/admin/subscriptions/{subscription_id}/cancel",
            post(vendors::handle_cancel_subscription),
        )
        .route("/api/admin/dashboard", get(vendors::handle_dashboard))
        // Vendor
        .route("/api/vendor/leads", get(portal::handle_list_my_leads))
        .route("/api/vendor/leads/available", get(portal::handle_list_available_leads))
        .route("/api/vendor/leads/{lead_id}", get(leads::handle_get_lead))
        .route("/api/vendor/leads/{lead_id}/take", post(portal::handle_take_lead))
        .route("/api/vendor/leads/{lead_id}/advance", post(leads::handle_advance_lead))
        .route("/api/vendor/leads/{lead_id}/notes", post(portal::handle_add_note))
        .route("/api/vendor/leads/{lead_id}/refund", post(portal::handle_request_refund))
        .route(
            "/api/vendor/subscription",
            get(portal::handle_my_subscriptions).post(portal::handle_purchase_plan),
        )
        .route(
            "/api/vendor/profile",
            get(portal::handle_get_profile).patch(portal::handle_update_profile),
        )
        .route("/api/vendor/pipeline", get(portal::handle_my_pipeline))
        .route("/api/live", get(live_events_handler))
        .with_state(app_state)
}

/// Creates the first admin when the operator table is empty.
fn bootstrap(persistence: &mut SqlitePersistence, args: &Args) -> Result<(), ApiError> {
    let (Some(login_name), Some(password)) = (&args.admin_login, &args.admin_password) else {
        if persistence.count_operators()? == 0 {
            warn!("No operators exist; set LEADHUB_ADMIN_LOGIN and LEADHUB_ADMIN_PASSWORD");
        }
        return Ok(());
    };

    match bootstrap_admin(persistence, login_name, password, OffsetDateTime::now_utc())? {
        Some(operator_id) => info!(operator_id, login_name = %login_name, "Bootstrapped admin"),
        None => info!("Operators already exist; skipping admin bootstrap"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing LeadHub Server");

    let mut persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    bootstrap(&mut persistence, &args)?;

    let app_state: AppState = AppState::new(persistence, Duration::days(args.session_days));
    let app: Router = build_router(app_state);

    let listener = tokio::net::TcpListener::bind((args.bind.as_str(), args.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
