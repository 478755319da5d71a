//! Query builder capability
//!
//! The engine never talks to a database. It hands [`Condition`] and
//! [`OrderBy`] values to a [`QueryBuilder`], threading the builder through
//! every step by value. Adapters decide how those values become a query.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::operator::Comparison;
use super::value::Scalar;

/// A single predicate appended to a query
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <op> value`
    Compare {
        column: String,
        op: Comparison,
        value: Scalar,
    },
    /// Column truncated to its calendar date, then compared
    CompareDate {
        column: String,
        op: Comparison,
        value: Scalar,
    },
    /// `lower(column) <op> value`, value already lower-cased
    CompareLower {
        column: String,
        op: Comparison,
        value: String,
    },
    /// Case-insensitive substring match on the column cast to text
    Contains { column: String, needle: String },
    In { column: String, values: Vec<Scalar> },
    IsNull { column: String },
    IsNotNull { column: String },
    /// SQL fragment with `?` placeholders bound in order
    Raw { sql: String, bindings: Vec<Scalar> },
    /// OR-combined group
    Any(Vec<Condition>),
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn is_desc(&self) -> bool {
        matches!(self, Self::Desc)
    }
}

impl TryFrom<String> for Direction {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(FilterError::UnknownDirection(value)),
        }
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.as_str().to_string()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ordering clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Column { column: String, direction: Direction },
    /// Order by the column truncated to its date component
    Date { column: String, direction: Direction },
}

/// Accumulator the engine appends predicates and orderings to
///
/// Only [`filter`](QueryBuilder::filter) and [`order`](QueryBuilder::order)
/// are required; the `where_*` and `order_by*` helpers build the matching
/// values.
pub trait QueryBuilder: Sized {
    fn filter(self, condition: Condition) -> Self;

    fn order(self, order: OrderBy) -> Self;

    fn where_cmp(self, column: &str, op: Comparison, value: Scalar) -> Self {
        self.filter(Condition::Compare {
            column: column.to_string(),
            op,
            value,
        })
    }

    fn where_date(self, column: &str, op: Comparison, value: Scalar) -> Self {
        self.filter(Condition::CompareDate {
            column: column.to_string(),
            op,
            value,
        })
    }

    fn where_in(self, column: &str, values: Vec<Scalar>) -> Self {
        self.filter(Condition::In {
            column: column.to_string(),
            values,
        })
    }

    fn where_null(self, column: &str) -> Self {
        self.filter(Condition::IsNull {
            column: column.to_string(),
        })
    }

    fn where_not_null(self, column: &str) -> Self {
        self.filter(Condition::IsNotNull {
            column: column.to_string(),
        })
    }

    fn where_raw(self, sql: impl Into<String>, bindings: Vec<Scalar>) -> Self {
        self.filter(Condition::Raw {
            sql: sql.into(),
            bindings,
        })
    }

    /// OR-combine a group; an empty group adds nothing
    fn where_any(self, conditions: Vec<Condition>) -> Self {
        if conditions.is_empty() {
            return self;
        }
        self.filter(Condition::Any(conditions))
    }

    fn order_by(self, column: &str, direction: Direction) -> Self {
        self.order(OrderBy::Column {
            column: column.to_string(),
            direction,
        })
    }

    fn order_by_date(self, column: &str, direction: Direction) -> Self {
        self.order(OrderBy::Date {
            column: column.to_string(),
            direction,
        })
    }
}

/// Builder that keeps everything it is given, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingBuilder {
    pub conditions: Vec<Condition>,
    pub orderings: Vec<OrderBy>,
}

impl QueryBuilder for RecordingBuilder {
    fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn order(mut self, order: OrderBy) -> Self {
        self.orderings.push(order);
        self
    }
}
