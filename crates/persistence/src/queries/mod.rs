// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! ## Module Organization
//!
//! - `audit`: Audit trail lookups
//! - `leads`: Lead listings, history and notes
//! - `operators`: Operator and session lookups
//! - `stats`: Aggregations for dashboards
//! - `subscriptions`: Plans and subscriptions
//! - `tickets`: Support tickets and threads
//! - `vendors`: Vendor lookups

pub mod audit;
pub mod leads;
pub mod operators;
pub mod stats;
pub mod subscriptions;
pub mod tickets;
pub mod vendors;

/// Builds a `LIKE` pattern matching `needle` anywhere, with `\` as the
/// escape character. `SQLite` `LIKE` is case-insensitive for ASCII.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern: String = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
