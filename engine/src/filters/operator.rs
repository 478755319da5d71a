//! Operator table
//!
//! Maps the short operator codes accepted in requests (`eq`, `gte`, ...)
//! to comparison semantics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Operator codes accepted from clients and entity definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Eq,
    Lte,
    Gte,
    Gt,
    Lt,
    Neq,
    In,
    /// Null / not-null toggle, checked before any type-specific handling
    Empty,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Lte,
        Operator::Gte,
        Operator::Gt,
        Operator::Lt,
        Operator::Neq,
        Operator::In,
        Operator::Empty,
    ];

    /// Resolve a request key; anything outside the table is a positional value
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "eq" => Some(Self::Eq),
            "lte" => Some(Self::Lte),
            "gte" => Some(Self::Gte),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "neq" => Some(Self::Neq),
            "in" => Some(Self::In),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Lte => "lte",
            Self::Gte => "gte",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Neq => "neq",
            Self::In => "in",
            Self::Empty => "empty",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Neq => "<>",
            Self::In => "in",
            Self::Empty => "empty",
        }
    }

    /// Plain comparison for this operator; `None` for `in` and `empty`
    pub fn comparison(&self) -> Option<Comparison> {
        match self {
            Self::Eq => Some(Comparison::Eq),
            Self::Lte => Some(Comparison::Lte),
            Self::Gte => Some(Comparison::Gte),
            Self::Gt => Some(Comparison::Gt),
            Self::Lt => Some(Comparison::Lt),
            Self::Neq => Some(Comparison::Neq),
            Self::In | Self::Empty => None,
        }
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    /// Accepts either the code (`gte`) or the symbol (`>=`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::from_code(s)
            .or_else(|| Self::ALL.into_iter().find(|op| op.symbol() == s))
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

impl TryFrom<String> for Operator {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.code().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Binary comparison carried by a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("eq", "=")]
    #[case("lte", "<=")]
    #[case("gte", ">=")]
    #[case("gt", ">")]
    #[case("lt", "<")]
    #[case("neq", "<>")]
    #[case("in", "in")]
    #[case("empty", "empty")]
    fn test_operator_table(#[case] code: &str, #[case] symbol: &str) {
        let op = Operator::from_code(code).unwrap();
        assert_eq!(op.symbol(), symbol);
        assert_eq!(op.code(), code);
    }

    #[test]
    fn test_unknown_code_is_positional() {
        assert_eq!(Operator::from_code("0"), None);
        assert_eq!(Operator::from_code("like"), None);
        assert_eq!(Operator::from_code("EQ"), None);
    }

    #[test]
    fn test_parse_accepts_symbols_in_definitions() {
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Gte);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::Neq);
        assert_eq!("in".parse::<Operator>().unwrap(), Operator::In);
        assert!("~".parse::<Operator>().is_err());
    }

    #[test]
    fn test_serde_uses_codes() {
        let op: Operator = serde_json::from_str(r#""<=""#).unwrap();
        assert_eq!(op, Operator::Lte);
        assert_eq!(serde_json::to_string(&op).unwrap(), r#""lte""#);
    }

    #[test]
    fn test_comparison_only_for_binary_operators() {
        assert_eq!(Operator::Neq.comparison(), Some(Comparison::Neq));
        assert_eq!(Operator::In.comparison(), None);
        assert_eq!(Operator::Empty.comparison(), None);
    }
}
