//! Boolean coercion through a configurable token set

use std::collections::HashSet;

use super::value::Scalar;

/// Tokens accepted as "true" when none are configured
pub const DEFAULT_TRUTHY_TOKENS: &[&str] = &["ДА", "Да", "да", "дА", "1", "true", "TRUE"];

/// Set of raw tokens that coerce to `true`
///
/// Matching is exact; locales add their own spellings through
/// configuration instead of case folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthyTokens {
    tokens: HashSet<String>,
}

impl TruthyTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Native booleans keep their value, numbers are true only when 1.
    ///
    /// Text must equal a token exactly, so `"01"` or `"1.0"` are not truthy
    /// unless listed.
    pub fn is_truthy(&self, value: &Scalar) -> bool {
        match value {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Int(i) => *i == 1,
            Scalar::Float(f) => *f == 1.0,
            Scalar::Text(s) => self.tokens.contains(s),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TruthyTokens {
    fn default() -> Self {
        Self::new(DEFAULT_TRUTHY_TOKENS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Scalar::from("1"), true)]
    #[case(Scalar::from("true"), true)]
    #[case(Scalar::from("TRUE"), true)]
    #[case(Scalar::from("да"), true)]
    #[case(Scalar::from("ДА"), true)]
    #[case(Scalar::Int(1), true)]
    #[case(Scalar::Bool(true), true)]
    #[case(Scalar::from("True"), false)]
    #[case(Scalar::from("0"), false)]
    #[case(Scalar::from("yes"), false)]
    #[case(Scalar::Int(2), false)]
    #[case(Scalar::Bool(false), false)]
    #[case(Scalar::Null, false)]
    fn test_default_tokens(#[case] value: Scalar, #[case] expected: bool) {
        assert_eq!(TruthyTokens::default().is_truthy(&value), expected);
    }

    #[test]
    fn test_custom_tokens_replace_defaults() {
        let tokens = TruthyTokens::new(["yes", "oui"]);
        assert!(tokens.is_truthy(&"oui".into()));
        assert!(!tokens.is_truthy(&"true".into()));
        // Native values do not depend on the token set
        assert!(tokens.is_truthy(&Scalar::Bool(true)));
        assert_eq!(tokens.len(), 2);
    }
}
