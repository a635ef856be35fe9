//! `SQLite` schema definitions for agridash.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the observations table.
pub const CREATE_OBSERVATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    soil_type TEXT NOT NULL,
    irrigation_method TEXT NOT NULL,
    seed_type TEXT NOT NULL,
    fertilizer_used TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `created_at` for ordering.
///
/// Added by migration 2 rather than the base schema.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_observations_created_at ON observations(created_at)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Base schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_OBSERVATIONS_TABLE, CREATE_METADATA_TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_observations_table_contains_required_columns() {
        assert!(CREATE_OBSERVATIONS_TABLE.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(CREATE_OBSERVATIONS_TABLE.contains("soil_type TEXT NOT NULL"));
        assert!(CREATE_OBSERVATIONS_TABLE.contains("irrigation_method TEXT NOT NULL"));
        assert!(CREATE_OBSERVATIONS_TABLE.contains("seed_type TEXT NOT NULL"));
        assert!(CREATE_OBSERVATIONS_TABLE.contains("fertilizer_used TEXT NOT NULL"));
        assert!(CREATE_OBSERVATIONS_TABLE.contains("created_at TEXT NOT NULL"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
