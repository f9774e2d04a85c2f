// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use leadhub::Authority;
use leadhub_audit::Actor;
use leadhub_persistence::{
    OperatorData, PersistenceError, SessionData, SqlitePersistence, verify_password,
};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::error::AuthError;

/// Operator roles.
///
/// Customers never log in; they only use the public lead form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Marketplace staff. Manages leads, vendors, plans and tickets.
    Admin,
    /// A login belonging to one vendor business.
    Vendor,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Vendor => "Vendor",
        }
    }

    /// Parses the stored role name.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown role.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        match raw {
            "Admin" => Ok(Self::Admin),
            "Vendor" => Ok(Self::Vendor),
            other => Err(AuthError::AuthenticationFailed {
                reason: format!("Invalid role: {other}"),
            }),
        }
    }
}

/// A logged-in operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    pub operator_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub role: Role,
    /// Set for vendor operators.
    pub vendor_id: Option<i64>,
}

impl AuthenticatedActor {
    /// Builds the actor for a stored operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the role is unknown or a vendor operator has no
    /// vendor.
    pub fn from_operator(operator: &OperatorData) -> Result<Self, AuthError> {
        let role: Role = Role::parse(&operator.role)?;
        if role == Role::Vendor && operator.vendor_id.is_none() {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Vendor operator is not linked to a vendor"),
            });
        }
        Ok(Self {
            operator_id: operator.operator_id,
            login_name: operator.login_name.clone(),
            display_name: operator.display_name.clone(),
            role,
            vendor_id: operator.vendor_id,
        })
    }

    /// The audit actor for events this operator causes.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        let actor_type: String = match self.role {
            Role::Admin => String::from("admin"),
            Role::Vendor => String::from("vendor"),
        };
        Actor::with_operator(
            format!("operator:{}", self.operator_id),
            actor_type,
            self.operator_id,
            self.login_name.clone(),
            self.display_name.clone(),
        )
    }

    /// The authority lifecycle rules see for this operator.
    #[must_use]
    pub fn authority(&self) -> Authority {
        match (self.role, self.vendor_id) {
            (Role::Vendor, Some(vendor_id)) => Authority::Vendor {
                operator_id: self.operator_id,
                vendor_id,
            },
            _ => Authority::Admin {
                operator_id: self.operator_id,
            },
        }
    }
}

/// Role checks run before any handler touches state.
pub struct AuthorizationService;

impl AuthorizationService {
    /// # Errors
    ///
    /// Returns an error unless the actor is an admin.
    pub fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        if actor.role == Role::Admin {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Admin"),
            })
        }
    }

    /// Returns the actor's vendor id.
    ///
    /// # Errors
    ///
    /// Returns an error unless the actor is a vendor operator.
    pub fn require_vendor(actor: &AuthenticatedActor, action: &str) -> Result<i64, AuthError> {
        match (actor.role, actor.vendor_id) {
            (Role::Vendor, Some(vendor_id)) => Ok(vendor_id),
            _ => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Vendor"),
            }),
        }
    }
}

/// Session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    pub const DEFAULT_SESSION_EXPIRATION: Duration = Duration::days(30);

    /// Checks credentials and opens a session.
    ///
    /// Unknown logins, wrong passwords and disabled accounts all produce
    /// the same message.
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `expires_at`)
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub fn login(
        persistence: &mut SqlitePersistence,
        login_name: &str,
        password: &str,
        now: OffsetDateTime,
        session_length: Duration,
    ) -> Result<(String, AuthenticatedActor, OffsetDateTime), AuthError> {
        let rejected = || AuthError::AuthenticationFailed {
            reason: String::from("Invalid login name or password"),
        };

        let Some(operator) = persistence
            .get_operator_by_login(login_name)
            .map_err(Self::map_persistence_error)?
        else {
            warn!(login_name, "Login attempt for unknown operator");
            return Err(rejected());
        };

        let password_ok: bool = verify_password(password, &operator.password_hash)
            .map_err(Self::map_persistence_error)?;
        if !password_ok {
            warn!(operator_id = operator.operator_id, "Login with wrong password");
            return Err(rejected());
        }
        if operator.is_disabled {
            warn!(operator_id = operator.operator_id, "Login to disabled operator");
            return Err(rejected());
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_operator(&operator)?;
        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = now + session_length;

        persistence
            .create_session(&session_token, operator.operator_id, now, expires_at)
            .map_err(Self::map_persistence_error)?;
        persistence
            .update_last_login(operator.operator_id, now)
            .map_err(Self::map_persistence_error)?;

        info!(
            operator_id = operator.operator_id,
            role = actor.role.as_str(),
            "Operator logged in"
        );
        Ok((session_token, actor, expires_at))
    }

    /// Resolves a bearer token to its operator and refreshes the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or the
    /// operator has been disabled since login.
    pub fn validate_session(
        persistence: &mut SqlitePersistence,
        session_token: &str,
        now: OffsetDateTime,
    ) -> Result<AuthenticatedActor, AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = OffsetDateTime::parse(&session.expires_at, &Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })?;
        if now > expires_at {
            persistence
                .delete_session(session_token)
                .map_err(Self::map_persistence_error)?;
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let operator: OperatorData = persistence
            .get_operator_by_id(session.operator_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Operator not found"),
            })?;
        if operator.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Operator is disabled"),
            });
        }

        persistence
            .update_session_activity(session.session_id, now)
            .map_err(Self::map_persistence_error)?;

        AuthenticatedActor::from_operator(&operator)
    }

    /// Ends a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn logout(
        persistence: &mut SqlitePersistence,
        session_token: &str,
    ) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(Self::map_persistence_error)
    }

    /// 256 random bits as hex.
    fn generate_session_token() -> String {
        (0..4).fold(String::with_capacity(64), |mut token, _| {
            token.push_str(&format!("{:016x}", rand::random::<u64>()));
            token
        })
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}
