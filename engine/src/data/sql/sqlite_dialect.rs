//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn cast_to_string(&self, col: &str) -> String {
        format!("CAST({} AS TEXT)", col)
    }

    fn cast_to_date(&self, expr: &str) -> String {
        format!("date({})", expr)
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        // SQLite stores booleans as integers
        if value { "1" } else { "0" }
    }
}
