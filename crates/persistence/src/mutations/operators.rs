// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator and session mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::NewOperator;
use crate::diesel_schema::{operators, sessions};
use crate::error::PersistenceError;
use crate::timestamps;

/// Login names are compared case-insensitively.
#[must_use]
pub fn normalize_login(login_name: &str) -> String {
    login_name.trim().to_lowercase()
}

/// Hashes a password with bcrypt.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PersistenceError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))
}

/// Creates a new operator.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `operator` - Login name (normalized), display name and plain-text
///   password (hashed here)
/// * `role` - `Admin` or `Vendor`
/// * `vendor_id` - The vendor a `Vendor` operator acts for
/// * `now` - Creation time
///
/// # Errors
///
/// Returns an error if the login name already exists or the insert fails.
pub fn create_operator(
    conn: &mut SqliteConnection,
    operator: NewOperator<'_>,
    role: &str,
    vendor_id: Option<i64>,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let normalized_login: String = normalize_login(operator.login_name);

    info!(
        "Creating operator with login_name: {}, display_name: {}, role: {}",
        normalized_login, operator.display_name, role
    );

    let password_hash: String = hash_password(operator.password)?;

    diesel::insert_into(operators::table)
        .values((
            operators::login_name.eq(&normalized_login),
            operators::display_name.eq(operator.display_name.trim()),
            operators::password_hash.eq(&password_hash),
            operators::role.eq(role),
            operators::vendor_id.eq(vendor_id),
            operators::created_at.eq(timestamps::encode(now)?),
        ))
        .execute(conn)?;

    let operator_id: i64 = conn.get_last_insert_rowid()?;
    info!(operator_id, "Operator created");

    Ok(operator_id)
}

/// Records a successful login.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_last_login(
    conn: &mut SqliteConnection,
    operator_id: i64,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    debug!("Updating last_login_at for operator ID: {}", operator_id);

    diesel::update(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .set(operators::last_login_at.eq(Some(timestamps::encode(now)?)))
        .execute(conn)?;

    Ok(())
}

/// Disables or re-enables every operator of a vendor.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn set_vendor_operators_disabled(
    conn: &mut SqliteConnection,
    vendor_id: i64,
    disabled: bool,
    now: OffsetDateTime,
) -> Result<usize, PersistenceError> {
    let disabled_at: Option<String> = if disabled {
        Some(timestamps::encode(now)?)
    } else {
        None
    };

    let rows_affected: usize = diesel::update(operators::table)
        .filter(operators::vendor_id.eq(vendor_id))
        .set((
            operators::is_disabled.eq(i32::from(disabled)),
            operators::disabled_at.eq(disabled_at),
        ))
        .execute(conn)?;

    info!(vendor_id, disabled, rows_affected, "Updated vendor operators");
    Ok(rows_affected)
}

/// Replaces an operator's password hash.
///
/// # Errors
///
/// Returns an error if the password cannot be hashed or the update fails.
pub fn update_password(
    conn: &mut SqliteConnection,
    operator_id: i64,
    new_password: &str,
) -> Result<(), PersistenceError> {
    info!("Updating password for operator ID: {}", operator_id);

    let password_hash: String = hash_password(new_password)?;
    let rows_affected: usize = diesel::update(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .set(operators::password_hash.eq(&password_hash))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::OperatorNotFound(format!(
            "Operator with ID {operator_id} not found"
        )));
    }
    Ok(())
}

/// Creates a new session for an operator.
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    operator_id: i64,
    now: OffsetDateTime,
    expires_at: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let created: String = timestamps::encode(now)?;

    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::operator_id.eq(operator_id),
            sessions::created_at.eq(&created),
            sessions::last_activity_at.eq(&created),
            sessions::expires_at.eq(timestamps::encode(expires_at)?),
        ))
        .execute(conn)?;

    let session_id: i64 = conn.get_last_insert_rowid()?;
    debug!(session_id, operator_id, "Session created");
    Ok(session_id)
}

/// Updates the last activity timestamp for a session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_session_activity(
    conn: &mut SqliteConnection,
    session_id: i64,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    diesel::update(sessions::table)
        .filter(sessions::session_id.eq(session_id))
        .set(sessions::last_activity_at.eq(timestamps::encode(now)?))
        .execute(conn)?;
    Ok(())
}

/// Deletes a session by token (logout).
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<(), PersistenceError> {
    debug!("Deleting session by token");

    diesel::delete(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .execute(conn)?;

    Ok(())
}

/// Deletes every session that expired before `now`.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(
    conn: &mut SqliteConnection,
    now: OffsetDateTime,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::expires_at.lt(timestamps::encode(now)?))
        .execute(conn)?;

    info!("Deleted {} expired sessions", rows_affected);
    Ok(rows_affected)
}

/// Deletes all sessions for an operator, e.g. after a password change.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_sessions_for_operator(
    conn: &mut SqliteConnection,
    operator_id: i64,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::operator_id.eq(operator_id))
        .execute(conn)?;

    info!(
        "Deleted {} sessions for operator ID: {}",
        rows_affected, operator_id
    );
    Ok(rows_affected)
}

/// Deletes the sessions of every operator of a vendor.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_sessions_for_vendor(
    conn: &mut SqliteConnection,
    vendor_id: i64,
) -> Result<usize, PersistenceError> {
    let vendor_operators = operators::table
        .filter(operators::vendor_id.eq(vendor_id))
        .select(operators::operator_id);

    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::operator_id.eq_any(vendor_operators))
        .execute(conn)?;

    debug!(vendor_id, rows_affected, "Deleted vendor sessions");
    Ok(rows_affected)
}
