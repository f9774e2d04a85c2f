// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::password_policy::PasswordPolicyError;
use leadhub::CoreError;
use leadhub_domain::DomainError;
use leadhub_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
/// The server maps each variant to exactly one HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed or the session is gone.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The actor's role does not allow the action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// The role is right but this record is off limits (another vendor's lead).
    Forbidden {
        /// The action that was attempted.
        action: String,
        /// Why it was refused.
        reason: String,
    },
    /// A business rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description.
        message: String,
    },
    /// Malformed or out-of-range input.
    InvalidInput {
        /// The offending field.
        field: String,
        /// A human-readable description.
        message: String,
    },
    /// The requested resource does not exist.
    ResourceNotFound {
        /// The type of resource.
        resource_type: String,
        /// A human-readable description.
        message: String,
    },
    /// The request lost a race or collides with existing state.
    Conflict {
        /// A human-readable description.
        message: String,
    },
    /// The CSV upload could not be read.
    InvalidCsvFormat {
        /// Why the file was rejected.
        reason: String,
    },
    /// A new password does not meet the policy.
    PasswordPolicyViolation {
        /// A human-readable description.
        message: String,
    },
    /// Something failed that the caller cannot fix.
    Internal {
        /// A human-readable description.
        message: String,
    },
}

impl ApiError {
    pub(crate) fn not_found(resource_type: &str, message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::Forbidden { action, reason } => {
                write!(f, "Not permitted to {action}: {reason}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => write!(f, "{resource_type} not found: {message}"),
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::InvalidCsvFormat { reason } => write!(f, "Invalid CSV format: {reason}"),
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        translate_core_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

/// Translates a domain error into an API error.
///
/// Input problems name the offending field; ownership problems become
/// `Forbidden`; races and duplicates become `Conflict`.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::InvalidCustomerName(_) => ApiError::invalid_input("customer_name", message),
        DomainError::InvalidEmail(_) => ApiError::invalid_input("email", message),
        DomainError::InvalidPhone(_) => ApiError::invalid_input("phone", message),
        DomainError::InvalidDescription(_) => ApiError::invalid_input("description", message),
        DomainError::InvalidBudget(_) => ApiError::invalid_input("budget", message),
        DomainError::InvalidCategory(_) => ApiError::invalid_input("category", message),
        DomainError::InvalidLocation(_) => ApiError::invalid_input("location", message),
        DomainError::InvalidLeadSource(_) => ApiError::invalid_input("source", message),
        DomainError::InvalidLeadStatus { .. } => ApiError::invalid_input("status", message),
        DomainError::InvalidLeadSort(_) => ApiError::invalid_input("sort", message),
        DomainError::InvalidNotes(_) => ApiError::invalid_input("notes", message),
        DomainError::InvalidBusinessName(_) => ApiError::invalid_input("business_name", message),
        DomainError::InvalidPlan(_) => ApiError::invalid_input("plan", message),
        DomainError::InvalidTicketStatus(_) => ApiError::invalid_input("status", message),
        DomainError::InvalidTicketPriority(_) => ApiError::invalid_input("priority", message),
        DomainError::InvalidTicketCategory(_) => ApiError::invalid_input("category", message),
        DomainError::InvalidSubject(_) => ApiError::invalid_input("subject", message),
        DomainError::InvalidMessageBody(_) => ApiError::invalid_input("body", message),
        DomainError::InvalidPage { .. } => ApiError::invalid_input("page", message),
        DomainError::InvalidPageSize { .. } => ApiError::invalid_input("per_page", message),
        DomainError::DateParseError { .. } => ApiError::invalid_input("date", message),
        DomainError::EmptyAssignment => ApiError::invalid_input("vendor_ids", message),

        DomainError::LeadNotFound(_) => ApiError::not_found("Lead", message),
        DomainError::VendorNotFound(_) => ApiError::not_found("Vendor", message),
        DomainError::PlanNotFound(_) => ApiError::not_found("Plan", message),
        DomainError::SubscriptionNotFound(_) => ApiError::not_found("Subscription", message),
        DomainError::TicketNotFound(_) => ApiError::not_found("Ticket", message),

        DomainError::VendorNotEligible { .. } => ApiError::Forbidden {
            action: String::from("take lead"),
            reason: message,
        },
        DomainError::NotLeadOwner { .. } => ApiError::Forbidden {
            action: String::from("act on lead"),
            reason: message,
        },

        DomainError::LeadAlreadyTaken { .. }
        | DomainError::QuotaExhausted { .. }
        | DomainError::ActiveSubscriptionExists { .. } => ApiError::Conflict { message },

        DomainError::InvalidStatusTransition { .. } => rule("lead_lifecycle", message),
        DomainError::LeadNotTakeable { .. } => rule("lead_takeable", message),
        DomainError::RefundWindowExpired { .. } => rule("refund_window", message),
        DomainError::NoRefundPending { .. } => rule("refund_pending", message),
        DomainError::VendorInactive(_) => rule("vendor_active", message),
        DomainError::PlanInactive(_) => rule("plan_active", message),
        DomainError::InvalidSubscriptionStatus(_) => rule("subscription_status", message),
        DomainError::NoActiveSubscription { .. } => rule("active_subscription", message),
        DomainError::InvalidTicketTransition { .. } => rule("ticket_lifecycle", message),
        DomainError::TicketClosed(_) => rule("ticket_open", message),
    }
}

fn rule(name: &str, message: String) -> ApiError {
    ApiError::DomainRuleViolation {
        rule: name.to_string(),
        message,
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::Forbidden { action, reason } => ApiError::Forbidden { action, reason },
        CoreError::Conflict { message } => ApiError::Conflict { message },
    }
}

/// Translates a persistence error into an API error.
///
/// Races detected inside a transaction surface as `Conflict`. Storage
/// faults are reported as `Internal` without leaking SQL detail.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::ActiveSubscriptionExists {
            vendor_id,
            subscription_id,
        } => translate_domain_error(DomainError::ActiveSubscriptionExists {
            vendor_id,
            subscription_id,
        }),
        PersistenceError::LeadTakeConflict { .. }
        | PersistenceError::QuotaUnavailable { .. }
        | PersistenceError::StaleRecord(_)
        | PersistenceError::UniqueViolation(_) => ApiError::Conflict {
            message: err.to_string(),
        },
        PersistenceError::NotFound(msg) => ApiError::not_found("Record", msg),
        PersistenceError::OperatorNotFound(msg) => ApiError::not_found("Operator", msg),
        PersistenceError::SessionNotFound(_) | PersistenceError::SessionExpired(_) => {
            ApiError::AuthenticationFailed {
                reason: String::from("Session is invalid or expired"),
            }
        }
        other => {
            tracing::error!(error = %other, "Persistence failure");
            ApiError::Internal {
                message: String::from("A storage error occurred"),
            }
        }
    }
}
