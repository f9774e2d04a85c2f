// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use leadhub_domain::DomainError;

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The actor is not allowed to perform the command on this record.
    Forbidden {
        /// The command that was attempted.
        action: String,
        /// Why it was refused.
        reason: String,
    },
    /// The record is held by someone else (e.g., a lead already taken).
    Conflict {
        /// Description of the competing state.
        message: String,
    },
}

impl CoreError {
    pub(crate) fn forbidden(action: &str, reason: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Forbidden { action, reason } => {
                write!(f, "Not permitted to {action}: {reason}")
            }
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
