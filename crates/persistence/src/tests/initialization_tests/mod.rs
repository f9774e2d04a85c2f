// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Every other test module opens a fresh in-memory database, so connection
//! setup and migrations are exercised throughout. These tests pin down the
//! guarantees the rest rely on.

use crate::tests::{now, seed_admin};
use crate::{NewOperator, SqlitePersistence};

#[test]
fn test_persistence_initialization() {
    let result: Result<SqlitePersistence, crate::error::PersistenceError> =
        SqlitePersistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1 = SqlitePersistence::new_in_memory().unwrap();
    let mut db2 = SqlitePersistence::new_in_memory().unwrap();

    seed_admin(&mut db1);

    assert_eq!(db1.count_operators().unwrap(), 1, "db1 should have 1 operator");
    assert_eq!(
        db2.count_operators().unwrap(),
        0,
        "db2 should have 0 operators (isolated)"
    );
}

#[test]
fn test_migrations_create_every_table() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    let tables = persistence.list_tables().unwrap();

    assert_eq!(
        tables,
        vec![
            "audit_events",
            "lead_notes",
            "lead_status_history",
            "lead_vendors",
            "leads",
            "operators",
            "sessions",
            "subscription_plans",
            "subscriptions",
            "support_tickets",
            "ticket_messages",
            "vendor_categories",
            "vendors",
        ]
    );
}

#[test]
fn test_foreign_keys_are_enforced() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    persistence.verify_foreign_key_enforcement().unwrap();

    // Vendor operators must point at an existing vendor.
    let result = persistence.create_operator(
        NewOperator {
            login_name: "ghost",
            display_name: "Ghost",
            password: "password123",
        },
        "Vendor",
        Some(999),
        now(),
    );
    assert!(result.is_err());
}

#[test]
fn test_file_database_keeps_data_across_reopen() {
    let dir = std::env::temp_dir().join(format!("leadhub-init-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("leadhub.db");
    let _ = std::fs::remove_file(&path);

    {
        let mut persistence = SqlitePersistence::new_with_file(&path).unwrap();
        seed_admin(&mut persistence);
    }
    let mut reopened = SqlitePersistence::new_with_file(&path).unwrap();
    assert_eq!(reopened.count_operators().unwrap(), 1);

    drop(reopened);
    let _ = std::fs::remove_dir_all(&dir);
}
