// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Axum route handlers.
//!
//! Each handler locks persistence, calls exactly one `leadhub_api` operation
//! with the session's actor, releases the lock and then publishes any live
//! event. Authorization decisions stay in the API layer.

pub mod leads;
pub mod portal;
pub mod public;
pub mod tickets;
pub mod vendors;
