// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The lead lifecycle engine.
//!
//! Every function here is pure: it takes the current record and a command
//! and returns the next record plus the audit event describing the change.
//! Persisting the result, including quota side effects, is the caller's job.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod apply;
mod command;
mod error;
mod state;
mod subscription;
mod ticket;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use apply::apply;
pub use command::{Command, TicketCommand};
pub use error::CoreError;
pub use state::{
    Authority, LeadContext, LeadTransition, QuotaEffect, StatusChange, SubscriptionTransition,
    TicketTransition, lead_snapshot, subscription_snapshot, ticket_snapshot,
};
pub use subscription::{Purchase, cancel_subscription, purchase_subscription};
pub use ticket::{NewTicket, apply_ticket, open_ticket};
