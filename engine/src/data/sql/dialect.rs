//! SQL dialect trait for multi-database support
//!
//! This trait defines the database-specific pieces the SQL adapter needs
//! when rendering filter predicates and orderings.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Text and date casts
/// - Boolean literals
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite/DuckDB/ClickHouse: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Cast a column to string type
    ///
    /// - DuckDB: `col::VARCHAR`
    /// - PostgreSQL: `col::TEXT`
    /// - SQLite: `CAST(col AS TEXT)`
    /// - ClickHouse: `toString(col)`
    fn cast_to_string(&self, col: &str) -> String;

    /// Truncate an expression to its calendar date
    ///
    /// - DuckDB: `CAST(col AS DATE)`
    /// - PostgreSQL: `col::DATE`
    /// - SQLite: `date(col)`
    /// - ClickHouse: `toDate(col)`
    fn cast_to_date(&self, expr: &str) -> String;

    /// Lower-case a text expression
    fn lower(&self, expr: &str) -> String {
        format!("lower({})", expr)
    }

    /// Boolean literal
    ///
    /// SQLite has no boolean type and stores flags as integers.
    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    /// Suffix naming the escape character for LIKE patterns
    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }
}
