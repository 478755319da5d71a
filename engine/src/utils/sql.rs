//! SQL utility functions

use std::sync::LazyLock;

use regex::Regex;

/// Plain or dotted (`table.column`) identifiers, no quoting
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("identifier pattern is valid")
});

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Use this when building LIKE patterns from user input to prevent
/// unintended pattern matching.
///
/// # Example
///
/// ```
/// use querysift_engine::utils::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Check that a column reference can be spliced into SQL text as-is
///
/// Column names reach the SQL adapter from entity definitions and, for
/// sorting, straight from the request, so anything that is not a bare
/// identifier is refused.
pub fn is_safe_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}
