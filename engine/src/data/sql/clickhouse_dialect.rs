//! ClickHouse SQL dialect implementation

use super::SqlDialect;

/// ClickHouse SQL dialect
pub struct ClickhouseDialect;

impl SqlDialect for ClickhouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn placeholder(&self, _index: usize) -> String {
        // ClickHouse uses ? for positional parameters
        "?".to_string()
    }

    fn cast_to_string(&self, col: &str) -> String {
        format!("toString({})", col)
    }

    fn cast_to_date(&self, expr: &str) -> String {
        format!("toDate({})", expr)
    }

    fn lower(&self, expr: &str) -> String {
        format!("lowerUTF8({})", expr)
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "true" } else { "false" }
    }

    fn like_escape(&self) -> &'static str {
        // Backslash is always the LIKE escape character
        ""
    }
}
