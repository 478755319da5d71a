//! Free-text search over the `search` pseudo-field
//!
//! Full mode ORs a substring match across every text field plus the
//! identity field. Fast mode only looks at the configured fields, each
//! matched per its own type, skipping fields the value cannot match.

use super::builder::{Condition, QueryBuilder};
use super::definition::{FieldType, FilterDefinition, FilterSpec};
use super::operator::Comparison;
use super::value::{RawFilterValue, Scalar};
use crate::utils::time::parse_date_like;

pub(crate) fn apply_search<B: QueryBuilder>(
    builder: B,
    definition: &FilterDefinition,
    raw: &RawFilterValue,
) -> B {
    let Some(value) = raw.as_scalar() else {
        tracing::debug!("Ignoring non-scalar search value");
        return builder;
    };

    let group = if definition.fast_search().is_empty() {
        full_search(definition, value)
    } else {
        fast_search(definition, value)
    };
    tracing::debug!(
        fast = !definition.fast_search().is_empty(),
        matches = group.len(),
        "Applying search"
    );
    builder.where_any(group)
}

fn full_search(definition: &FilterDefinition, value: &Scalar) -> Vec<Condition> {
    let identity = definition.identity_field();
    definition
        .registry()
        .iter()
        .filter_map(|(name, spec)| {
            let column = spec.column.as_deref()?;
            if name == identity {
                // Leading digits only: "1e3" searches for id 1
                Some(Condition::Compare {
                    column: column.to_string(),
                    op: Comparison::Eq,
                    value: Scalar::Int(value.to_int()),
                })
            } else if spec.field_type.is_text() {
                Some(contains(column, value))
            } else {
                None
            }
        })
        .collect()
}

fn fast_search(definition: &FilterDefinition, value: &Scalar) -> Vec<Condition> {
    let identity = definition.identity_field();
    definition
        .fast_search()
        .iter()
        .filter_map(|name| {
            let spec = definition.registry().lookup(name)?;
            let column = spec.column.as_deref()?;
            if name == identity && value.is_int() {
                return Some(equals(column, value.clone()));
            }
            fast_match(definition, spec, column, value)
        })
        .collect()
}

/// Per-type match, `None` when the value cannot match this field
fn fast_match(
    definition: &FilterDefinition,
    spec: &FilterSpec,
    column: &str,
    value: &Scalar,
) -> Option<Condition> {
    match spec.field_type {
        FieldType::Text | FieldType::StrictText => Some(contains(column, value)),
        FieldType::Bool | FieldType::BoolRaw if value.is_numeric() => Some(equals(
            column,
            Scalar::Bool(definition.truthy().is_truthy(value)),
        )),
        FieldType::Number | FieldType::Percent | FieldType::Numeric if value.is_numeric() => {
            Some(equals(column, value.to_numeric()))
        }
        FieldType::Date | FieldType::Datetime
            if parse_date_like(&value.to_text()).is_some() =>
        {
            Some(equals(column, value.clone()))
        }
        _ => None,
    }
}

fn contains(column: &str, value: &Scalar) -> Condition {
    Condition::Contains {
        column: column.to_string(),
        needle: value.to_text().to_lowercase(),
    }
}

fn equals(column: &str, value: Scalar) -> Condition {
    Condition::Compare {
        column: column.to_string(),
        op: Comparison::Eq,
        value,
    }
}
