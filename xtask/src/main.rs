// Copyright (C) 2024-2025 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project Automation
//!
//! `cargo xtask <command>` wraps the lint, build, test and coverage
//! invocations CI runs, so a contributor can reproduce a CI failure with one
//! command.
//!
//! `verify-migrations` applies the `SQLite` migrations to a scratch in-memory
//! database and checks the resulting tables, columns, primary keys and
//! foreign keys against the checked-in Diesel schema. A migration edited
//! without regenerating `diesel_schema.rs` (or the reverse) fails here
//! instead of at runtime. It also reverts every migration and checks that
//! nothing is left behind.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{fmt::Debug, io, process::Output, vec};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    eyre::{eyre, Context},
    Result,
};
use diesel::sql_types::{Integer, Text};
use diesel::{QueryableByName, RunQueryDsl, SqliteConnection};
use duct::cmd;
use std::collections::{BTreeMap, BTreeSet};
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

/// The Diesel schema the persistence crate compiles against.
const DIESEL_SCHEMA: &str = include_str!("../../crates/persistence/src/diesel_schema.rs");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test, migrations)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Generate code coverage report
    #[command(visible_alias = "cov")]
    Coverage,

    /// Check dependencies
    #[command(visible_alias = "cd")]
    Deny,

    /// Check unused dependencies
    #[command(visible_alias = "m")]
    Machete,

    /// Lint formatting, typos, clippy, and docs
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the project
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check documentation for errors and warnings
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check for formatting issues in the project
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Lint markdown files
    #[command(visible_alias = "md")]
    LintMarkdown,

    /// Check for typos in the project
    #[command(visible_alias = "lt")]
    LintTypos,

    /// Apply every automatic fix (clippy, formatting, typos)
    #[command(visible_alias = "f")]
    Fix,

    /// Fix clippy warnings in the project
    #[command(visible_alias = "fc")]
    FixClippy,

    /// Fix formatting issues in the project
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Fix typos in the project
    #[command(visible_alias = "typos")]
    FixTypos,

    /// Run tests
    #[command(visible_alias = "t")]
    Test,

    /// Run doc tests
    #[command(visible_alias = "td")]
    TestDocs,

    /// Run lib tests
    #[command(visible_alias = "tl")]
    TestLibs,

    /// Check the migrations against the Diesel schema
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Deny => deny(),
            Self::Machete => machete(),
            Self::Coverage => coverage(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => lint_format(),
            Self::LintTypos => lint_typos(),
            Self::LintMarkdown => lint_markdown(),
            Self::Fix => fix(),
            Self::FixClippy => fix_clippy(),
            Self::FixFormatting => fix_format(),
            Self::FixTypos => fix_typos(),
            Self::Test => test(),
            Self::TestDocs => test_docs(),
            Self::TestLibs => test_libs(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

/// Run CI checks (lint, build, test, migrations)
fn ci() -> Result<()> {
    lint()?;
    deny()?;
    machete()?;
    build()?;
    verify_migrations()?;
    test()?;
    Ok(())
}

fn deny() -> Result<()> {
    run_cargo(vec!["deny", "check"])
}

fn machete() -> Result<()> {
    cmd!("cargo-machete").run_with_trace()?;
    Ok(())
}

/// Build the project
fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Run cargo check
fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

/// Generate code coverage report
fn coverage() -> Result<()> {
    run_cargo(vec![
        "llvm-cov",
        "--lcov",
        "--output-path",
        "target/lcov.info",
        "--all-features",
    ])
}

/// Lint formatting, typos, clippy, and docs (and a soft fail on markdown)
fn lint() -> Result<()> {
    lint_clippy()?;
    lint_docs()?;
    lint_format()?;
    lint_typos()?;
    if let Err(err) = lint_markdown() {
        tracing::warn!("markdownlint reported issues: {err}");
    }
    Ok(())
}

/// Run clippy on the project
fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

fn fix() -> Result<()> {
    fix_clippy()?;
    fix_format()?;
    fix_typos()?;
    Ok(())
}

/// Fix clippy warnings in the project
fn fix_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--fix",
        "--allow-dirty",
        "--allow-staged",
        "--",
        "-D",
        "warnings",
    ])
}

/// Check that docs build without errors using docs.rs-equivalent flags
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        cmd(
            "cargo",
            [
                "doc",
                "--no-deps",
                "--all-features",
                "--package",
                &package.name,
            ],
        )
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings")
        .run_with_trace()?;
    }

    Ok(())
}

/// Lint formatting issues in the project
fn lint_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all", "--check"])
}

/// Fix formatting issues in the project
fn fix_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all"])
}

/// Lint markdown files using [markdownlint-cli2](https://github.com/DavidAnson/markdownlint-cli2)
fn lint_markdown() -> Result<()> {
    cmd!("markdownlint-cli2", "**/*.md", "!target", "!**/target").run_with_trace()?;

    Ok(())
}

/// Check for typos in the project using [typos-cli](https://github.com/crate-ci/typos/)
fn lint_typos() -> Result<()> {
    cmd!("typos").run_with_trace()?;
    Ok(())
}

/// Fix typos in the project
fn fix_typos() -> Result<()> {
    cmd!("typos", "-w").run_with_trace()?;
    Ok(())
}

/// Run tests for libs and docs
fn test() -> Result<()> {
    test_libs()?;
    test_docs()?; // run last because it's slow
    Ok(())
}

/// Run doc tests for the workspace's default packages
fn test_docs() -> Result<()> {
    run_cargo(vec!["test", "--doc", "--all-features"])
}

/// Run lib tests for the workspace's default packages
fn test_libs() -> Result<()> {
    run_cargo(vec!["test", "--all-targets", "--all-features"])
}

/// Run a cargo subcommand with the default toolchain
fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// Run a cargo subcommand with the nightly toolchain
fn run_cargo_nightly(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args)
        // CARGO env var is set because we're running in a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// Verify the migrations against the Diesel schema.
///
/// 1. Applies every migration to an in-memory `SQLite` database
/// 2. Introspects the result (tables, columns, types, nullability, keys)
/// 3. Parses `crates/persistence/src/diesel_schema.rs` into the same shape
/// 4. Compares the two and fails on the first difference
/// 5. Reverts all migrations and checks that no tables remain
///
/// Needs no external services.
fn verify_migrations() -> Result<()> {
    use diesel::Connection;
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

    tracing::info!("Starting migration verification");

    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;

    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys on SQLite")?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply SQLite migrations: {}", e))?;
    tracing::info!("Migrations applied successfully");

    tracing::info!("Introspecting migrated schema");
    let migrated = introspect_sqlite_schema(&mut conn)?;

    tracing::info!("Parsing Diesel schema");
    let declared = parse_diesel_schema(DIESEL_SCHEMA)?;

    tracing::info!(tables = migrated.tables.len(), "Comparing schemas");
    compare_schemas(&migrated, &declared)?;

    tracing::info!("Reverting all migrations");
    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to revert migrations: {}", e))?;
    let leftover = introspect_sqlite_schema(&mut conn)?;
    if !leftover.tables.is_empty() {
        return Err(eyre!(
            "❌ Migration check FAILED: tables left after revert: {:?}",
            leftover.tables.keys().collect::<Vec<_>>()
        ));
    }

    tracing::info!("✓ Migration verification passed");
    Ok(())
}

/// Normalized schema representation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Column {
    name: String,
    normalized_type: String,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
}

/// Introspect `SQLite` schema
fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
    }

    let mut schema = Schema::default();

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name"
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    for table in tables {
        let mut table_info = Table::default();

        let columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get columns for table {}", table.name))?;

        for col in columns {
            let normalized_type = normalize_sqlite_type(&col.r#type);
            // SQLite reports INTEGER PRIMARY KEY columns as nullable.
            let nullable = col.notnull == 0 && col.pk == 0;
            table_info.columns.insert(
                col.name.clone(),
                Column {
                    name: col.name.clone(),
                    normalized_type,
                    nullable,
                },
            );

            if col.pk > 0 {
                table_info.primary_keys.insert(col.name);
            }
        }

        let fks: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err(format!(
                    "Failed to get foreign keys for table {}",
                    table.name
                ))?;

        for fk in fks {
            table_info.foreign_keys.insert(ForeignKey {
                from_column: fk.from,
                to_table: fk.table,
            });
        }

        schema.tables.insert(table.name, table_info);
    }

    Ok(schema)
}

/// Parses the `diesel::table!` and `diesel::joinable!` blocks that
/// `diesel print-schema` writes.
fn parse_diesel_schema(source: &str) -> Result<Schema> {
    let mut schema = Schema::default();
    let mut current: Option<(String, Table)> = None;
    let mut joins: Vec<(String, ForeignKey)> = Vec::new();

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("diesel::joinable!(") {
            joins.push(parse_joinable(rest)?);
            continue;
        }

        if line == "}" {
            if let Some((name, table)) = current.take() {
                schema.tables.insert(name, table);
            }
            continue;
        }

        match current.as_mut() {
            None => current = parse_table_header(line),
            Some((name, table)) => {
                let (column, sql_type) = line
                    .trim_end_matches(',')
                    .split_once("->")
                    .ok_or_else(|| eyre!("Unexpected line in table '{name}': {line}"))?;
                let column = column.trim().to_string();
                let sql_type = sql_type.trim();
                let (inner, nullable) = sql_type
                    .strip_prefix("Nullable<")
                    .and_then(|t| t.strip_suffix('>'))
                    .map_or((sql_type, false), |t| (t, true));
                table.columns.insert(
                    column.clone(),
                    Column {
                        name: column,
                        normalized_type: normalize_diesel_type(inner),
                        nullable,
                    },
                );
            }
        }
    }

    if let Some((name, _)) = current {
        return Err(eyre!("Unterminated table! block for '{name}'"));
    }

    for (child, fk) in joins {
        schema
            .tables
            .get_mut(&child)
            .ok_or_else(|| eyre!("joinable! names unknown table '{child}'"))?
            .foreign_keys
            .insert(fk);
    }

    Ok(schema)
}

/// `audit_events (event_id) {` or `lead_vendors (lead_id, vendor_id) {`
fn parse_table_header(line: &str) -> Option<(String, Table)> {
    let body = line.strip_suffix('{')?.trim();
    let (name, keys) = body.split_once('(')?;
    let keys = keys.strip_suffix(')')?;
    let name = name.trim();
    if name.is_empty() || name.contains("::") {
        return None;
    }

    let table = Table {
        primary_keys: keys.split(',').map(|k| k.trim().to_string()).collect(),
        ..Table::default()
    };
    Some((name.to_string(), table))
}

/// `lead_notes -> leads (lead_id));`
fn parse_joinable(rest: &str) -> Result<(String, ForeignKey)> {
    let parse = || -> Option<(String, ForeignKey)> {
        let rest = rest.trim_end_matches(';').trim_end_matches(')');
        let (child, target) = rest.split_once("->")?;
        let (parent, column) = target.split_once('(')?;
        Some((
            child.trim().to_string(),
            ForeignKey {
                from_column: column.trim().to_string(),
                to_table: parent.trim().to_string(),
            },
        ))
    };
    parse().ok_or_else(|| eyre!("Malformed joinable!: {rest}"))
}

/// Normalize `SQLite` type to common representation
fn normalize_sqlite_type(sqlite_type: &str) -> String {
    let normalized = sqlite_type.to_uppercase();
    if normalized.contains("INT") || normalized.contains("BOOL") {
        "integer".to_string()
    } else if normalized.contains("TEXT")
        || normalized.contains("CHAR")
        || normalized.contains("CLOB")
    {
        "text".to_string()
    } else if normalized.contains("REAL")
        || normalized.contains("FLOA")
        || normalized.contains("DOUB")
    {
        "real".to_string()
    } else if normalized.contains("BLOB") {
        "blob".to_string()
    } else {
        "text".to_string() // Default for SQLite
    }
}

/// Normalize a Diesel SQL type to the same representation
#[allow(clippy::match_same_arms)]
fn normalize_diesel_type(diesel_type: &str) -> String {
    match diesel_type {
        "TinyInt" | "SmallInt" | "Integer" | "BigInt" | "Bool" => "integer".to_string(),
        "Float" | "Double" | "Numeric" => "real".to_string(),
        "Text" | "VarChar" => "text".to_string(),
        "Binary" => "blob".to_string(),
        _ => "text".to_string(),
    }
}

/// Compare schemas and fail on mismatch. Every declared foreign key must
/// exist in the migrated schema; the migrations may declare more.
fn compare_schemas(migrated: &Schema, declared: &Schema) -> Result<()> {
    let migrated_tables: BTreeSet<_> = migrated.tables.keys().collect();
    let declared_tables: BTreeSet<_> = declared.tables.keys().collect();

    if migrated_tables != declared_tables {
        let mut errors = Vec::new();

        for table in migrated_tables.difference(&declared_tables) {
            errors.push(format!(
                "  - Table '{table}' is created by a migration but missing from diesel_schema.rs"
            ));
        }

        for table in declared_tables.difference(&migrated_tables) {
            errors.push(format!(
                "  - Table '{table}' is in diesel_schema.rs but no migration creates it"
            ));
        }

        return Err(eyre!(
            "❌ Migration check FAILED: Table mismatch\n{}",
            errors.join("\n")
        ));
    }

    for table_name in migrated_tables {
        let migrated_table = &migrated.tables[table_name];
        let declared_table = &declared.tables[table_name];

        let migrated_columns: BTreeSet<_> = migrated_table.columns.keys().collect();
        let declared_columns: BTreeSet<_> = declared_table.columns.keys().collect();

        if migrated_columns != declared_columns {
            let mut errors = Vec::new();

            for col in migrated_columns.difference(&declared_columns) {
                errors.push(format!(
                    "    - Column '{col}' exists in the migrations but not in diesel_schema.rs"
                ));
            }

            for col in declared_columns.difference(&migrated_columns) {
                errors.push(format!(
                    "    - Column '{col}' exists in diesel_schema.rs but not in the migrations"
                ));
            }

            return Err(eyre!(
                "❌ Migration check FAILED: Column mismatch in table '{}'\n{}",
                table_name,
                errors.join("\n")
            ));
        }

        for col_name in migrated_columns {
            let migrated_col = &migrated_table.columns[col_name];
            let declared_col = &declared_table.columns[col_name];

            if migrated_col.normalized_type != declared_col.normalized_type {
                return Err(eyre!(
                    "❌ Migration check FAILED: Type mismatch in table '{}', column '{}'\n  migrations: {}\n  diesel_schema.rs: {}",
                    table_name,
                    col_name,
                    migrated_col.normalized_type,
                    declared_col.normalized_type
                ));
            }

            if migrated_col.nullable != declared_col.nullable {
                return Err(eyre!(
                    "❌ Migration check FAILED: Nullability mismatch in table '{}', column '{}'\n  migrations nullable: {}\n  diesel_schema.rs nullable: {}",
                    table_name,
                    col_name,
                    migrated_col.nullable,
                    declared_col.nullable
                ));
            }
        }

        if migrated_table.primary_keys != declared_table.primary_keys {
            return Err(eyre!(
                "❌ Migration check FAILED: Primary key mismatch in table '{}'\n  migrations: {:?}\n  diesel_schema.rs: {:?}",
                table_name,
                migrated_table.primary_keys,
                declared_table.primary_keys
            ));
        }

        let missing: Vec<_> = declared_table
            .foreign_keys
            .difference(&migrated_table.foreign_keys)
            .collect();
        if !missing.is_empty() {
            return Err(eyre!(
                "❌ Migration check FAILED: Foreign keys in diesel_schema.rs with no REFERENCES in table '{}'\n  {:?}",
                table_name,
                missing
            ));
        }
    }

    Ok(())
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
