// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Field-level validation for customer, vendor and ticket input.
//!
//! Functions that return a `String` also normalize their input; callers
//! must store the returned value rather than the raw input.

use crate::error::DomainError;

/// Maximum length of a customer name, in characters.
pub const MAX_CUSTOMER_NAME_LEN: usize = 120;
/// Maximum length of a lead description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Maximum length of a location, in characters.
pub const MAX_LOCATION_LEN: usize = 200;
/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 7;
/// Maximum number of digits in a phone number.
pub const MAX_PHONE_DIGITS: usize = 15;
/// Maximum length of an email address.
pub const MAX_EMAIL_LEN: usize = 254;
/// Minimum length of a refund request reason, in characters.
pub const MIN_REFUND_REASON_LEN: usize = 10;
/// Maximum length of free-form notes and reasons, in characters.
pub const MAX_NOTES_LEN: usize = 2000;
/// Maximum length of a vendor business name, in characters.
pub const MAX_BUSINESS_NAME_LEN: usize = 120;
/// Minimum length of a ticket subject, in characters.
pub const MIN_SUBJECT_LEN: usize = 3;
/// Maximum length of a ticket subject, in characters.
pub const MAX_SUBJECT_LEN: usize = 200;
/// Maximum length of a ticket message body, in characters.
pub const MAX_MESSAGE_LEN: usize = 5000;

/// Characters stripped from phone numbers before counting digits.
const PHONE_PUNCTUATION: [char; 5] = ['+', '-', '(', ')', ' '];

/// Validates and trims a customer name.
///
/// # Errors
///
/// Returns an error if the trimmed name is empty or longer than
/// [`MAX_CUSTOMER_NAME_LEN`] characters.
pub fn validate_customer_name(raw: &str) -> Result<String, DomainError> {
    let name: &str = raw.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidCustomerName(String::from(
            "Name cannot be empty",
        )));
    }
    if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        return Err(DomainError::InvalidCustomerName(format!(
            "Name must be at most {MAX_CUSTOMER_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Validates an email address and returns it trimmed and lowercased.
///
/// The check is structural only: exactly one `@`, a non-empty local part,
/// and a domain containing a dot with no empty labels.
///
/// # Errors
///
/// Returns an error if the address does not have that shape.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email: String = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::InvalidEmail(String::from(
            "Email cannot be empty",
        )));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(DomainError::InvalidEmail(format!(
            "Email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidEmail(String::from(
            "Email cannot contain whitespace",
        )));
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DomainError::InvalidEmail(String::from(
            "Email must contain exactly one '@'",
        )));
    };

    if local.is_empty() {
        return Err(DomainError::InvalidEmail(String::from(
            "Email is missing the part before '@'",
        )));
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(DomainError::InvalidEmail(format!(
            "'{domain}' is not a valid email domain"
        )));
    }

    Ok(email)
}

/// Validates a phone number and returns its digits.
///
/// Spaces, dashes, parentheses and plus signs are ignored.
///
/// # Errors
///
/// Returns an error if anything other than those characters and digits is
/// present, or the digit count is outside
/// [`MIN_PHONE_DIGITS`]..=[`MAX_PHONE_DIGITS`].
pub fn normalize_phone(raw: &str) -> Result<String, DomainError> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| !PHONE_PUNCTUATION.contains(c))
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::InvalidPhone(String::from(
            "Phone number may only contain digits, spaces, '+', '-', '(' and ')'",
        )));
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(DomainError::InvalidPhone(format!(
            "Phone number must have between {MIN_PHONE_DIGITS} and {MAX_PHONE_DIGITS} digits"
        )));
    }

    Ok(digits)
}

/// Validates and trims a lead description. An empty description is allowed.
///
/// # Errors
///
/// Returns an error if the description exceeds [`MAX_DESCRIPTION_LEN`].
pub fn validate_description(raw: &str) -> Result<String, DomainError> {
    let description: &str = raw.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::InvalidDescription(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description.to_string())
}

/// Validates and trims a service location.
///
/// # Errors
///
/// Returns an error if the location is empty or exceeds
/// [`MAX_LOCATION_LEN`].
pub fn validate_location(raw: &str) -> Result<String, DomainError> {
    let location: &str = raw.trim();
    if location.is_empty() {
        return Err(DomainError::InvalidLocation(String::from(
            "Location cannot be empty",
        )));
    }
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(DomainError::InvalidLocation(format!(
            "Location must be at most {MAX_LOCATION_LEN} characters"
        )));
    }
    Ok(location.to_string())
}

/// Validates an optional budget expressed in cents.
///
/// # Errors
///
/// Returns an error if the budget is negative.
pub const fn validate_budget(budget_cents: Option<i64>) -> Result<(), DomainError> {
    match budget_cents {
        Some(value) if value < 0 => Err(DomainError::InvalidBudget(value)),
        _ => Ok(()),
    }
}

/// Validates optional free-form notes, returning `None` for blank input.
///
/// # Errors
///
/// Returns an error if the notes exceed [`MAX_NOTES_LEN`].
pub fn validate_notes(raw: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(notes) = raw.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(DomainError::InvalidNotes(format!(
            "Notes must be at most {MAX_NOTES_LEN} characters"
        )));
    }
    Ok(Some(notes.to_string()))
}

/// Validates a required reason (cancellation, note body).
///
/// # Errors
///
/// Returns an error if the reason is blank or exceeds [`MAX_NOTES_LEN`].
pub fn validate_reason(raw: &str) -> Result<String, DomainError> {
    validate_notes(Some(raw))?.ok_or_else(|| {
        DomainError::InvalidNotes(String::from("A reason is required"))
    })
}

/// Validates the reason given with a refund request.
///
/// # Errors
///
/// Returns an error if the reason is shorter than
/// [`MIN_REFUND_REASON_LEN`] or longer than [`MAX_NOTES_LEN`].
pub fn validate_refund_reason(raw: &str) -> Result<String, DomainError> {
    let reason: &str = raw.trim();
    if reason.chars().count() < MIN_REFUND_REASON_LEN {
        return Err(DomainError::InvalidNotes(format!(
            "Refund reason must be at least {MIN_REFUND_REASON_LEN} characters"
        )));
    }
    validate_reason(reason)
}

/// Validates and trims a vendor business name.
///
/// # Errors
///
/// Returns an error if the name is empty or exceeds
/// [`MAX_BUSINESS_NAME_LEN`].
pub fn validate_business_name(raw: &str) -> Result<String, DomainError> {
    let name: &str = raw.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidBusinessName(String::from(
            "Business name cannot be empty",
        )));
    }
    if name.chars().count() > MAX_BUSINESS_NAME_LEN {
        return Err(DomainError::InvalidBusinessName(format!(
            "Business name must be at most {MAX_BUSINESS_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Validates and trims a ticket subject.
///
/// # Errors
///
/// Returns an error if the subject length is outside
/// [`MIN_SUBJECT_LEN`]..=[`MAX_SUBJECT_LEN`].
pub fn validate_subject(raw: &str) -> Result<String, DomainError> {
    let subject: &str = raw.trim();
    let len: usize = subject.chars().count();
    if !(MIN_SUBJECT_LEN..=MAX_SUBJECT_LEN).contains(&len) {
        return Err(DomainError::InvalidSubject(format!(
            "Subject must be between {MIN_SUBJECT_LEN} and {MAX_SUBJECT_LEN} characters"
        )));
    }
    Ok(subject.to_string())
}

/// Validates a ticket message body. Surrounding whitespace is removed.
///
/// # Errors
///
/// Returns an error if the body is blank or exceeds [`MAX_MESSAGE_LEN`].
pub fn validate_message_body(raw: &str) -> Result<String, DomainError> {
    let body: &str = raw.trim();
    if body.is_empty() {
        return Err(DomainError::InvalidMessageBody(String::from(
            "Message cannot be empty",
        )));
    }
    if body.chars().count() > MAX_MESSAGE_LEN {
        return Err(DomainError::InvalidMessageBody(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(body.to_string())
}
