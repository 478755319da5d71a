//! Raw filter values
//!
//! Requests carry loosely typed values: a scalar, a list of scalars, or a
//! map from operator code to scalar (`{"gte": 5}`).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::operator::Operator;
use crate::utils::string::{leading_int, parse_numeric};

/// Raw filters keyed by field name, in request order
pub type RawFilters = IndexMap<String, RawFilterValue>;

/// A single loosely typed value, also used as a bound query parameter
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numeric scalar, integral values collapse to `Int`
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
            Self::Int(value as i64)
        } else {
            Self::Float(value)
        }
    }

    /// String form used for text matching and list splitting
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "1".to_string(),
            Self::Bool(false) => String::new(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Values that carry no filter intent: null, false, zero, `""` and `"0"`
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty() || s == "0",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if f.is_finite() => Some(*f),
            Self::Text(s) => parse_numeric(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Numeric-looking text becomes a number; everything else is passed through
    pub fn to_numeric(&self) -> Self {
        match self {
            Self::Text(s) => match s.trim().parse::<i64>() {
                Ok(i) => Self::Int(i),
                Err(_) => parse_numeric(s).map_or_else(|| self.clone(), Self::Float),
            },
            _ => self.clone(),
        }
    }

    /// Integer from the leading digits, `0` when there are none
    pub fn to_int(&self) -> i64 {
        match self {
            Self::Null => 0,
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Float(f) => *f as i64,
            Self::Text(s) => leading_int(s),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{}", b),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One raw filter value as supplied for a field
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawFilterValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    /// Operator-tagged values; keys outside the operator table are positional
    Keyed(IndexMap<String, Scalar>),
}

/// A value paired with the operator the client attached to it, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterEntry<'a> {
    pub operator: Option<Operator>,
    pub value: &'a Scalar,
}

impl RawFilterValue {
    pub fn entries(&self) -> Vec<FilterEntry<'_>> {
        match self {
            Self::Scalar(value) => vec![FilterEntry {
                operator: None,
                value,
            }],
            Self::List(values) => values
                .iter()
                .map(|value| FilterEntry {
                    operator: None,
                    value,
                })
                .collect(),
            Self::Keyed(map) => map
                .iter()
                .map(|(key, value)| FilterEntry {
                    operator: Operator::from_code(key),
                    value,
                })
                .collect(),
        }
    }

    /// All values in order, operator keys dropped
    pub fn values(&self) -> Vec<&Scalar> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::List(values) => values.iter().collect(),
            Self::Keyed(map) => map.values().collect(),
        }
    }

    /// Values handed to field overrides
    pub fn non_blank_values(&self) -> Vec<Scalar> {
        self.values()
            .into_iter()
            .filter(|v| !v.is_blank())
            .cloned()
            .collect()
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Append a positional value, turning a lone scalar into a list
    pub(crate) fn push(&mut self, value: Scalar) {
        match self {
            Self::List(values) => values.push(value),
            Self::Keyed(map) => {
                // Next slot after the highest numeric key, never an existing one
                let next = map
                    .keys()
                    .filter_map(|k| k.parse::<usize>().ok())
                    .max()
                    .map_or(0, |max| max + 1);
                map.insert(next.to_string(), value);
            }
            Self::Scalar(_) => *self = Self::List(vec![value]),
        }
    }

    /// Set a keyed value, turning a scalar or list into a map
    pub(crate) fn insert(&mut self, key: String, value: Scalar) {
        match self {
            Self::Keyed(map) => {
                map.insert(key, value);
            }
            Self::List(values) => {
                let mut map: IndexMap<String, Scalar> = values
                    .drain(..)
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect();
                map.insert(key, value);
                *self = Self::Keyed(map);
            }
            Self::Scalar(_) => *self = Self::Keyed(IndexMap::from([(key, value)])),
        }
    }
}

impl From<Scalar> for RawFilterValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for RawFilterValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<Vec<Scalar>> for RawFilterValue {
    fn from(values: Vec<Scalar>) -> Self {
        Self::List(values)
    }
}
