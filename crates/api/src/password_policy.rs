// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password rules for admin and vendor logins.

use thiserror::Error;

/// bcrypt ignores everything past 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Logins shorter than this are not checked for inclusion in the password.
const MIN_CHECKED_NAME_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    #[error("Password must be at most {MAX_PASSWORD_BYTES} bytes long")]
    TooLong,

    #[error(
        "Password needs {required} of: uppercase letter, lowercase letter, digit, symbol (found {found})"
    )]
    InsufficientComplexity { required: usize, found: usize },

    #[error("Password must not contain the {field}")]
    ContainsAccountName { field: String },

    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,
}

/// Length and character-class requirements.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// Character classes required, out of four.
    pub min_classes: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            min_classes: 3,
        }
    }
}

impl PasswordPolicy {
    /// Checks a new password for an account.
    ///
    /// # Errors
    ///
    /// Returns the first rule the password breaks.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        login_name: &str,
        display_name: &str,
    ) -> Result<(), PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }
        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordPolicyError::TooLong);
        }

        let found: usize = character_classes(password);
        if found < self.min_classes {
            return Err(PasswordPolicyError::InsufficientComplexity {
                required: self.min_classes,
                found,
            });
        }

        let lowered: String = password.to_lowercase();
        for (field, name) in [("login name", login_name), ("display name", display_name)] {
            let name: String = name.trim().to_lowercase();
            if name.chars().count() >= MIN_CHECKED_NAME_LEN && lowered.contains(&name) {
                return Err(PasswordPolicyError::ContainsAccountName {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn character_classes(password: &str) -> usize {
    let checks: [fn(&char) -> bool; 4] = [
        char::is_ascii_uppercase,
        char::is_ascii_lowercase,
        char::is_ascii_digit,
        |c: &char| !c.is_alphanumeric() && !c.is_whitespace(),
    ];
    checks
        .iter()
        .filter(|check| password.chars().any(|c| check(&c)))
        .count()
}
