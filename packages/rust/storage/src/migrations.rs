//! Schema migrations for the magedocs database.
//!
//! Migrations are applied in order on open. Every statement is idempotent, so
//! re-applying a migration to an initialized database is harmless.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "documents table with FTS5 index",
        sql: include_str!("schema.sql"),
    }]
}
