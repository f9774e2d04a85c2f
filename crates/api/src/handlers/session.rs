// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Login, logout, identity and password handlers.

use leadhub_audit::{Action, Actor, AuditEvent, AuditSubject, Cause};
use leadhub_persistence::{NewOperator, OperatorData, SqlitePersistence, verify_password};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use super::{operator_event, snapshot};
use crate::auth::{AuthenticatedActor, AuthenticationService, Role};
use crate::error::ApiError;
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, WhoAmIResponse,
};

/// # Errors
///
/// Returns an error if the credentials are rejected.
pub fn login(
    persistence: &mut SqlitePersistence,
    request: &LoginRequest,
    now: OffsetDateTime,
    session_length: Duration,
) -> Result<LoginResponse, ApiError> {
    let (session_token, actor, expires_at) = AuthenticationService::login(
        persistence,
        &request.login_name,
        &request.password,
        now,
        session_length,
    )?;

    Ok(LoginResponse {
        session_token,
        operator_id: actor.operator_id,
        login_name: actor.login_name,
        display_name: actor.display_name,
        role: actor.role.as_str().to_string(),
        vendor_id: actor.vendor_id,
        expires_at,
    })
}

/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub fn logout(
    persistence: &mut SqlitePersistence,
    session_token: &str,
) -> Result<MessageResponse, ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(MessageResponse {
        message: String::from("Logged out"),
    })
}

#[must_use]
pub fn whoami(actor: &AuthenticatedActor) -> WhoAmIResponse {
    WhoAmIResponse {
        operator_id: actor.operator_id,
        login_name: actor.login_name.clone(),
        display_name: actor.display_name.clone(),
        role: actor.role.as_str().to_string(),
        vendor_id: actor.vendor_id,
    }
}

/// Changes the actor's own password and ends every session it holds,
/// including the current one.
///
/// # Errors
///
/// Returns an error if the current password is wrong or the new one
/// breaks the policy.
pub fn change_password(
    persistence: &mut SqlitePersistence,
    request: &ChangePasswordRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<MessageResponse, ApiError> {
    let operator: OperatorData = persistence
        .get_operator_by_id(actor.operator_id)?
        .ok_or_else(|| ApiError::not_found("Operator", actor.login_name.clone()))?;

    if !verify_password(&request.current_password, &operator.password_hash)? {
        warn!(operator_id = actor.operator_id, "Password change with wrong current password");
        return Err(ApiError::AuthenticationFailed {
            reason: String::from("Current password is incorrect"),
        });
    }

    PasswordPolicy::default().validate(
        &request.new_password,
        &request.new_password_confirmation,
        &operator.login_name,
        &operator.display_name,
    )?;

    persistence.update_password(actor.operator_id, &request.new_password)?;
    let ended: usize = persistence.delete_sessions_for_operator(actor.operator_id)?;

    let event: AuditEvent = operator_event(
        actor,
        cause,
        "ChangePassword",
        format!("Operator {} changed their password", operator.login_name),
        snapshot("password=unchanged"),
        snapshot("password=changed"),
        AuditSubject::Global,
    );
    persistence.persist_audit_event(&event, now)?;

    info!(operator_id = actor.operator_id, sessions_ended = ended, "Password changed");
    Ok(MessageResponse {
        message: String::from("Password changed; please log in again"),
    })
}

/// Creates the first admin account on an empty database.
///
/// Returns `None` when any operator already exists.
///
/// # Errors
///
/// Returns an error if the password breaks the policy or the insert fails.
pub fn bootstrap_admin(
    persistence: &mut SqlitePersistence,
    login_name: &str,
    password: &str,
    now: OffsetDateTime,
) -> Result<Option<i64>, ApiError> {
    if persistence.count_operators()? > 0 {
        return Ok(None);
    }

    let display_name: &str = "Administrator";
    PasswordPolicy::default().validate(password, password, login_name, display_name)?;

    let operator_id: i64 = persistence.create_operator(
        NewOperator {
            login_name,
            display_name,
            password,
        },
        Role::Admin.as_str(),
        None,
        now,
    )?;

    let event: AuditEvent = AuditEvent::new(
        Actor::system(),
        Cause::new(
            String::from("bootstrap"),
            String::from("First administrator created at startup"),
        ),
        Action::new(
            String::from("BootstrapAdmin"),
            Some(format!("Created administrator '{login_name}'")),
        ),
        snapshot("operators=0"),
        snapshot(format!("operators=1,admin={operator_id}")),
        AuditSubject::Global,
    );
    persistence.persist_audit_event(&event, now)?;

    info!(operator_id, login_name, "Bootstrapped first administrator");
    Ok(Some(operator_id))
}
