// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! All mutations use Diesel DSL against a `SqliteConnection`. Writes that
//! must land together (a lead change, its history row and its audit event)
//! run inside one `IMMEDIATE` transaction so concurrent writers serialize
//! on the database lock instead of failing mid-way.
//!
//! ## Module Organization
//!
//! - `audit`: Audit event persistence
//! - `leads`: Lead inserts, edits, deletion, transitions and the take path
//! - `operators`: Operator and session mutations
//! - `subscriptions`: Plans and subscriptions
//! - `tickets`: Support tickets and their messages
//! - `vendors`: Vendor accounts

pub mod audit;
pub mod leads;
pub mod operators;
pub mod subscriptions;
pub mod tickets;
pub mod vendors;
