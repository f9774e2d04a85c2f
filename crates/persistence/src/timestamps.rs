// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! TEXT encodings for timestamps and dates.
//!
//! Timestamps are stored in UTC at second precision with a trailing `Z`,
//! which is valid RFC 3339 and sorts lexically in time order.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::PersistenceError;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Encodes a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the year cannot be formatted.
pub fn encode(ts: OffsetDateTime) -> Result<String, PersistenceError> {
    ts.to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("timestamp: {e}")))
}

/// Decodes a stored timestamp.
///
/// # Errors
///
/// Returns an error if the text is not in the storage format.
pub fn decode(raw: &str) -> Result<OffsetDateTime, PersistenceError> {
    PrimitiveDateTime::parse(raw, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| PersistenceError::ReconstructionError(format!("timestamp '{raw}': {e}")))
}

/// # Errors
///
/// Returns an error if the timestamp cannot be formatted.
pub fn encode_opt(ts: Option<OffsetDateTime>) -> Result<Option<String>, PersistenceError> {
    ts.map(encode).transpose()
}

/// # Errors
///
/// Returns an error if the text is not in the storage format.
pub fn decode_opt(raw: Option<&str>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    raw.map(decode).transpose()
}

/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn encode_date(date: Date) -> Result<String, PersistenceError> {
    date.format(DATE_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("date: {e}")))
}

/// # Errors
///
/// Returns an error if the text is not a `YYYY-MM-DD` date.
pub fn decode_date(raw: &str) -> Result<Date, PersistenceError> {
    Date::parse(raw, DATE_FORMAT)
        .map_err(|e| PersistenceError::ReconstructionError(format!("date '{raw}': {e}")))
}
