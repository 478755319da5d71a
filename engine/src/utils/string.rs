//! String utility functions

use std::sync::LazyLock;

use regex::Regex;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$")
        .expect("numeric pattern is valid")
});

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("integer pattern is valid"));

/// Remove backslash escapes, keeping the escaped character.
///
/// `a\,b` becomes `a,b` and `a\\b` becomes `a\b`. A trailing lone
/// backslash is dropped.
pub fn strip_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a decimal or scientific number, tolerating surrounding whitespace.
///
/// Words such as `inf` or `NaN` are rejected even though `f64` would
/// accept them.
pub fn parse_numeric(s: &str) -> Option<f64> {
    if !NUMERIC.is_match(s) {
        return None;
    }
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer read from the leading digits of a string, `0` when there are none.
///
/// Out-of-range values saturate. Exponents are not read, so `"1e3"` is `1`.
pub fn leading_int(s: &str) -> i64 {
    let Some(caps) = LEADING_INT.captures(s) else {
        return 0;
    };
    let digits = &caps[1];
    digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_slashes() {
        assert_eq!(strip_slashes(r"a\,b"), "a,b");
        assert_eq!(strip_slashes(r"O\'Brien"), "O'Brien");
        assert_eq!(strip_slashes(r"back\\slash"), r"back\slash");
        assert_eq!(strip_slashes("trailing\\"), "trailing");
        assert_eq!(strip_slashes("plain"), "plain");
    }

    #[test]
    fn test_parse_numeric_accepts_numbers() {
        assert_eq!(parse_numeric("10"), Some(10.0));
        assert_eq!(parse_numeric(" -2.5 "), Some(-2.5));
        assert_eq!(parse_numeric(".5"), Some(0.5));
        assert_eq!(parse_numeric("1e3"), Some(1000.0));
        assert_eq!(parse_numeric("+7"), Some(7.0));
    }

    #[test]
    fn test_parse_numeric_rejects_words() {
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("12abc"), None);
        assert_eq!(parse_numeric("1,5"), None);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("42"), 42);
        assert_eq!(leading_int("  -7 apples"), -7);
        assert_eq!(leading_int("12abc"), 12);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("99999999999999999999"), i64::MAX);
    }
}
