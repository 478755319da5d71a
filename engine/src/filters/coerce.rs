//! Type coercers
//!
//! One strategy per [`FieldType`]. Each turns the raw entries of a single
//! field into predicates on the builder. Values that cannot be coerced are
//! passed through untouched; the database reports the mismatch.

use super::builder::{Condition, QueryBuilder};
use super::definition::{FieldType, FilterSpec};
use super::operator::{Comparison, Operator};
use super::truthy::TruthyTokens;
use super::value::{FilterEntry, RawFilterValue, Scalar};
use crate::utils::string::strip_slashes;

/// Coercion context for one declared field
pub(crate) struct FieldCoercer<'a> {
    pub name: &'a str,
    pub spec: &'a FilterSpec,
    pub truthy: &'a TruthyTokens,
}

impl FieldCoercer<'_> {
    /// Append every predicate the raw value asks for
    pub fn apply<B: QueryBuilder>(&self, builder: B, raw: &RawFilterValue) -> B {
        let column = self.spec.column_or(self.name);

        if self.spec.field_type == FieldType::Array {
            return self.apply_array(builder, column, raw);
        }

        raw.entries().into_iter().fold(builder, |builder, entry| {
            let op = entry.operator.or(self.spec.operator);
            if op == Some(Operator::Empty) {
                return self.apply_empty(builder, column, entry.value);
            }
            tracing::trace!(
                field = self.name,
                column,
                op = ?op,
                field_type = ?self.spec.field_type,
                "Coercing filter value"
            );
            self.apply_entry(builder, column, op, entry)
        })
    }

    fn apply_entry<B: QueryBuilder>(
        &self,
        builder: B,
        column: &str,
        op: Option<Operator>,
        entry: FilterEntry<'_>,
    ) -> B {
        let value = entry.value;
        match self.spec.field_type {
            FieldType::Text => text(builder, column, op, value),
            FieldType::StrictText => strict_text(builder, column, op, value),
            FieldType::Number => number(builder, column, op, value),
            FieldType::NumberOr => number_or(builder, column, op, value),
            FieldType::Numeric | FieldType::Percent => {
                let scale = if self.spec.field_type == FieldType::Percent {
                    100.0
                } else {
                    1.0
                };
                let bucket = Bucket {
                    step: self.spec.bucket_step(),
                    scale,
                };
                bucket.apply(builder, column, op, value)
            }
            FieldType::Bool | FieldType::BoolRaw => {
                let mut flag = self.truthy.is_truthy(value);
                if op == Some(Operator::Neq) {
                    flag = !flag;
                }
                if self.spec.field_type == FieldType::Bool {
                    builder.where_cmp(column, Comparison::Eq, Scalar::Bool(flag))
                } else {
                    builder.where_raw(format!("{} = ?", column), vec![Scalar::Bool(flag)])
                }
            }
            FieldType::Date | FieldType::Datetime => {
                // Only the operator sent by the client bypasses date truncation
                let explicit = entry.operator.and_then(|o| o.comparison());
                date(builder, column, op, explicit, self.spec.field_type, value)
            }
            // Handled before the per-entry loop
            FieldType::Array => builder,
        }
    }

    fn apply_empty<B: QueryBuilder>(&self, builder: B, column: &str, value: &Scalar) -> B {
        if self.truthy.is_truthy(value) {
            builder.where_null(column)
        } else {
            builder.where_not_null(column)
        }
    }

    /// Membership over every value regardless of operator, `empty` entries aside
    fn apply_array<B: QueryBuilder>(&self, builder: B, column: &str, raw: &RawFilterValue) -> B {
        let entries = raw.entries();
        let (toggles, members): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| e.operator == Some(Operator::Empty));

        let builder = toggles
            .into_iter()
            .fold(builder, |b, e| self.apply_empty(b, column, e.value));

        if members.is_empty() {
            return builder;
        }
        builder.where_in(column, members.into_iter().map(|e| e.value.clone()).collect())
    }
}

fn text<B: QueryBuilder>(builder: B, column: &str, op: Option<Operator>, value: &Scalar) -> B {
    let raw = value.to_text();
    match op {
        Some(Operator::In) => {
            let items = raw
                .trim()
                .split(',')
                .map(|item| Scalar::Text(strip_slashes(item).to_lowercase()))
                .collect();
            builder.where_in(column, items)
        }
        Some(Operator::Eq) | Some(Operator::Neq) => {
            let cmp = if op == Some(Operator::Eq) {
                Comparison::Eq
            } else {
                Comparison::Neq
            };
            builder.filter(Condition::CompareLower {
                column: column.to_string(),
                op: cmp,
                value: raw.to_lowercase(),
            })
        }
        _ => builder.filter(Condition::Contains {
            column: column.to_string(),
            needle: raw.to_lowercase(),
        }),
    }
}

/// `in` expects `"a","b","c"`: outer quotes stripped, split on `","`
fn strict_text<B: QueryBuilder>(
    builder: B,
    column: &str,
    op: Option<Operator>,
    value: &Scalar,
) -> B {
    let raw = value.to_text();
    if op == Some(Operator::In) {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        chars.next();
        chars.next_back();
        let items = chars
            .as_str()
            .split("\",\"")
            .map(|item| Scalar::Text(strip_slashes(item)))
            .collect();
        return builder.where_in(column, items);
    }

    builder.filter(Condition::CompareLower {
        column: column.to_string(),
        op: Comparison::Eq,
        value: raw.to_lowercase(),
    })
}

/// Comma-separated members; `None` when fewer than two
fn split_members(value: &Scalar) -> Option<Vec<String>> {
    let raw = value.to_text();
    let items: Vec<String> = raw.split(',').map(str::to_string).collect();
    (items.len() > 1).then_some(items)
}

fn number<B: QueryBuilder>(builder: B, column: &str, op: Option<Operator>, value: &Scalar) -> B {
    if op == Some(Operator::In) {
        return match split_members(value) {
            Some(items) => builder.where_in(column, numeric_items(&items)),
            None => builder.where_cmp(column, Comparison::Eq, value.to_numeric()),
        };
    }
    let cmp = op.and_then(|o| o.comparison()).unwrap_or(Comparison::Eq);
    builder.where_cmp(column, cmp, value.to_numeric())
}

/// Same as `number`, OR-combined over every mapped column
fn number_or<B: QueryBuilder>(
    builder: B,
    columns: &str,
    op: Option<Operator>,
    value: &Scalar,
) -> B {
    let columns = columns.split(',').map(str::trim);
    let group = if op == Some(Operator::In) {
        match split_members(value) {
            Some(items) => {
                let values = numeric_items(&items);
                columns
                    .map(|column| Condition::In {
                        column: column.to_string(),
                        values: values.clone(),
                    })
                    .collect()
            }
            None => columns
                .map(|column| Condition::Compare {
                    column: column.to_string(),
                    op: Comparison::Eq,
                    value: value.to_numeric(),
                })
                .collect(),
        }
    } else {
        let cmp = op.and_then(|o| o.comparison()).unwrap_or(Comparison::Eq);
        columns
            .map(|column| Condition::Compare {
                column: column.to_string(),
                op: cmp,
                value: value.to_numeric(),
            })
            .collect()
    };
    builder.where_any(group)
}

fn numeric_items(items: &[String]) -> Vec<Scalar> {
    items
        .iter()
        .map(|item| Scalar::Text(item.clone()).to_numeric())
        .collect()
}

/// Half-open range matching for stored floats, `[v, v + step)`
struct Bucket {
    step: f64,
    /// Divisor applied to client values before comparison
    scale: f64,
}

impl Bucket {
    fn apply<B: QueryBuilder>(
        &self,
        builder: B,
        column: &str,
        op: Option<Operator>,
        value: &Scalar,
    ) -> B {
        match op {
            Some(Operator::In) => match split_members(value) {
                Some(items) => {
                    let values = items
                        .iter()
                        .map(|item| self.scaled(&Scalar::Text(item.clone())))
                        .collect();
                    builder.where_in(column, values)
                }
                None => self.range(builder, column, value),
            },
            None | Some(Operator::Eq) => self.range(builder, column, value),
            Some(other) => {
                let cmp = other.comparison().unwrap_or(Comparison::Eq);
                builder.where_cmp(column, cmp, self.scaled(value))
            }
        }
    }

    fn range<B: QueryBuilder>(&self, builder: B, column: &str, value: &Scalar) -> B {
        let Some(number) = value.as_number() else {
            tracing::debug!(column, value = %value, "Non-numeric bucket value, comparing as-is");
            return builder.where_cmp(column, Comparison::Eq, value.clone());
        };
        let lower = number / self.scale;
        builder
            .where_cmp(column, Comparison::Gte, Scalar::number(lower))
            .where_cmp(column, Comparison::Lt, Scalar::number(lower + self.step))
    }

    fn scaled(&self, value: &Scalar) -> Scalar {
        match value.as_number() {
            Some(number) => Scalar::number(number / self.scale),
            None => value.to_numeric(),
        }
    }
}

fn date<B: QueryBuilder>(
    builder: B,
    column: &str,
    op: Option<Operator>,
    explicit: Option<Comparison>,
    field_type: FieldType,
    value: &Scalar,
) -> B {
    if op == Some(Operator::In) {
        return match split_members(value) {
            Some(items) => builder.where_in(column, items.into_iter().map(Scalar::Text).collect()),
            None => builder.where_cmp(column, Comparison::Eq, value.clone()),
        };
    }

    if let Some(cmp) = explicit {
        return builder.where_cmp(column, cmp, value.clone());
    }

    let cmp = op.and_then(|o| o.comparison()).unwrap_or(Comparison::Eq);
    match field_type {
        FieldType::Date => builder.where_date(column, cmp, value.clone()),
        _ => builder.where_cmp(column, cmp, value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builder::RecordingBuilder;
    use serde_json::json;

    fn run(spec: FilterSpec, value: serde_json::Value) -> Vec<Condition> {
        let truthy = TruthyTokens::default();
        let coercer = FieldCoercer {
            name: "field",
            spec: &spec,
            truthy: &truthy,
        };
        let raw: RawFilterValue = serde_json::from_value(value).unwrap();
        coercer.apply(RecordingBuilder::default(), &raw).conditions
    }

    fn cmp(column: &str, op: Comparison, value: Scalar) -> Condition {
        Condition::Compare {
            column: column.into(),
            op,
            value,
        }
    }

    #[test]
    fn test_text_defaults_to_substring() {
        let spec = FilterSpec::new(FieldType::Text).with_column("status_col");
        assert_eq!(
            run(spec, json!("Active")),
            vec![Condition::Contains {
                column: "status_col".into(),
                needle: "active".into()
            }]
        );
    }

    #[test]
    fn test_text_eq_and_neq_are_exact() {
        let spec = FilterSpec::new(FieldType::Text).with_column("name");
        assert_eq!(
            run(spec.clone(), json!({"neq": "Bob"})),
            vec![Condition::CompareLower {
                column: "name".into(),
                op: Comparison::Neq,
                value: "bob".into()
            }]
        );
        let spec = spec.with_operator(Operator::Eq);
        assert_eq!(
            run(spec, json!("Bob")),
            vec![Condition::CompareLower {
                column: "name".into(),
                op: Comparison::Eq,
                value: "bob".into()
            }]
        );
    }

    #[test]
    fn test_text_in_splits_lowercases_and_unescapes() {
        let spec = FilterSpec::new(FieldType::Text).with_column("tag");
        assert_eq!(
            run(spec, json!({"in": " Red,O\\'Neil,BLUE "})),
            vec![Condition::In {
                column: "tag".into(),
                values: vec!["red".into(), "o'neil".into(), "blue".into()]
            }]
        );
    }

    #[test]
    fn test_strict_text_default_is_exact() {
        let spec = FilterSpec::new(FieldType::StrictText).with_column("code");
        assert_eq!(
            run(spec, json!("AbC")),
            vec![Condition::CompareLower {
                column: "code".into(),
                op: Comparison::Eq,
                value: "abc".into()
            }]
        );
    }

    #[test]
    fn test_strict_text_in_parses_quoted_list() {
        let spec = FilterSpec::new(FieldType::StrictText).with_column("code");
        assert_eq!(
            run(spec, json!({"in": r#""a,1","b\"q","c""#})),
            vec![Condition::In {
                column: "code".into(),
                values: vec!["a,1".into(), "b\"q".into(), "c".into()]
            }]
        );
    }

    #[test]
    fn test_number_uses_operator_or_equality() {
        let spec = FilterSpec::new(FieldType::Number).with_column("qty");
        assert_eq!(
            run(spec.clone(), json!("7")),
            vec![cmp("qty", Comparison::Eq, Scalar::Int(7))]
        );
        assert_eq!(
            run(spec, json!({"gte": 5, "lt": "10"})),
            vec![
                cmp("qty", Comparison::Gte, Scalar::Int(5)),
                cmp("qty", Comparison::Lt, Scalar::Int(10)),
            ]
        );
    }

    #[test]
    fn test_number_in_degrades_to_equality_for_one_value() {
        let spec = FilterSpec::new(FieldType::Number).with_column("qty");
        assert_eq!(
            run(spec.clone(), json!({"in": "1,2,3"})),
            vec![Condition::In {
                column: "qty".into(),
                values: vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]
            }]
        );
        assert_eq!(
            run(spec, json!({"in": "4"})),
            vec![cmp("qty", Comparison::Eq, Scalar::Int(4))]
        );
    }

    #[test]
    fn test_number_passes_non_numeric_through() {
        let spec = FilterSpec::new(FieldType::Number).with_column("qty");
        assert_eq!(
            run(spec, json!("abc")),
            vec![cmp("qty", Comparison::Eq, "abc".into())]
        );
    }

    #[test]
    fn test_number_or_groups_columns() {
        let spec = FilterSpec::new(FieldType::NumberOr).with_column("net,gross");
        assert_eq!(
            run(spec.clone(), json!({"gt": 100})),
            vec![Condition::Any(vec![
                cmp("net", Comparison::Gt, Scalar::Int(100)),
                cmp("gross", Comparison::Gt, Scalar::Int(100)),
            ])]
        );
        assert_eq!(
            run(spec, json!({"in": "1,2"})),
            vec![Condition::Any(vec![
                Condition::In {
                    column: "net".into(),
                    values: vec![Scalar::Int(1), Scalar::Int(2)]
                },
                Condition::In {
                    column: "gross".into(),
                    values: vec![Scalar::Int(1), Scalar::Int(2)]
                },
            ])]
        );
    }

    #[test]
    fn test_numeric_buckets_by_step() {
        let spec = FilterSpec::new(FieldType::Numeric)
            .with_column("score")
            .with_step(5.0);
        assert_eq!(
            run(spec, json!(10)),
            vec![
                cmp("score", Comparison::Gte, Scalar::Int(10)),
                cmp("score", Comparison::Lt, Scalar::Int(15)),
            ]
        );
    }

    #[test]
    fn test_numeric_explicit_operator_compares_directly() {
        let spec = FilterSpec::new(FieldType::Numeric).with_column("score");
        assert_eq!(
            run(spec.clone(), json!({"lte": "2.5"})),
            vec![cmp("score", Comparison::Lte, Scalar::Float(2.5))]
        );
        // `eq` still buckets
        assert_eq!(
            run(spec, json!({"eq": 3})),
            vec![
                cmp("score", Comparison::Gte, Scalar::Int(3)),
                cmp("score", Comparison::Lt, Scalar::Int(4)),
            ]
        );
    }

    #[test]
    fn test_numeric_in_single_value_falls_back_to_bucket() {
        let spec = FilterSpec::new(FieldType::Numeric).with_column("score");
        assert_eq!(
            run(spec.clone(), json!({"in": "3"})),
            vec![
                cmp("score", Comparison::Gte, Scalar::Int(3)),
                cmp("score", Comparison::Lt, Scalar::Int(4)),
            ]
        );
        assert_eq!(
            run(spec, json!({"in": "3,4"})),
            vec![Condition::In {
                column: "score".into(),
                values: vec![Scalar::Int(3), Scalar::Int(4)]
            }]
        );
    }

    #[test]
    fn test_percent_divides_by_hundred() {
        let spec = FilterSpec::new(FieldType::Percent).with_column("rate");
        assert_eq!(
            run(spec.clone(), json!(50)),
            vec![
                cmp("rate", Comparison::Gte, Scalar::Float(0.5)),
                cmp("rate", Comparison::Lt, Scalar::Float(0.51)),
            ]
        );
        assert_eq!(
            run(spec.clone(), json!({"gt": "25"})),
            vec![cmp("rate", Comparison::Gt, Scalar::Float(0.25))]
        );
        assert_eq!(
            run(spec, json!({"in": "10,200"})),
            vec![Condition::In {
                column: "rate".into(),
                values: vec![Scalar::Float(0.1), Scalar::Int(2)]
            }]
        );
    }

    #[test]
    fn test_bool_negates_on_neq() {
        let spec = FilterSpec::new(FieldType::Bool).with_column("active");
        assert_eq!(
            run(spec.clone(), json!({"neq": "true"})),
            vec![cmp("active", Comparison::Eq, Scalar::Bool(false))]
        );
        assert_eq!(
            run(spec, json!("да")),
            vec![cmp("active", Comparison::Eq, Scalar::Bool(true))]
        );
    }

    #[test]
    fn test_bool_raw_issues_raw_predicate() {
        let spec = FilterSpec::new(FieldType::BoolRaw).with_column("flags_enabled");
        assert_eq!(
            run(spec, json!("0")),
            vec![Condition::Raw {
                sql: "flags_enabled = ?".into(),
                bindings: vec![Scalar::Bool(false)]
            }]
        );
    }

    #[test]
    fn test_date_truncates_on_default_path() {
        let spec = FilterSpec::new(FieldType::Date).with_column("created_at");
        assert_eq!(
            run(spec.clone(), json!("2024-01-15")),
            vec![Condition::CompareDate {
                column: "created_at".into(),
                op: Comparison::Eq,
                value: "2024-01-15".into()
            }]
        );
        // Explicit client operator compares the raw column
        assert_eq!(
            run(spec, json!({"gte": "2024-01-15"})),
            vec![cmp("created_at", Comparison::Gte, "2024-01-15".into())]
        );
    }

    #[test]
    fn test_date_uses_definition_operator() {
        let spec = FilterSpec::new(FieldType::Date)
            .with_column("created_at")
            .with_operator(Operator::Gte);
        assert_eq!(
            run(spec, json!("2024-01-15")),
            vec![Condition::CompareDate {
                column: "created_at".into(),
                op: Comparison::Gte,
                value: "2024-01-15".into()
            }]
        );
    }

    #[test]
    fn test_datetime_compares_full_timestamp() {
        let spec = FilterSpec::new(FieldType::Datetime).with_column("seen_at");
        assert_eq!(
            run(spec.clone(), json!("2024-01-15 10:00:00")),
            vec![cmp("seen_at", Comparison::Eq, "2024-01-15 10:00:00".into())]
        );
        assert_eq!(
            run(spec, json!({"in": "2024-01-01,2024-01-02"})),
            vec![Condition::In {
                column: "seen_at".into(),
                values: vec!["2024-01-01".into(), "2024-01-02".into()]
            }]
        );
    }

    #[test]
    fn test_array_is_always_membership() {
        let spec = FilterSpec::new(FieldType::Array).with_column("tags");
        assert_eq!(
            run(spec.clone(), json!(["a", "b"])),
            vec![Condition::In {
                column: "tags".into(),
                values: vec!["a".into(), "b".into()]
            }]
        );
        assert_eq!(
            run(spec, json!({"gt": "x"})),
            vec![Condition::In {
                column: "tags".into(),
                values: vec!["x".into()]
            }]
        );
    }

    #[test]
    fn test_empty_toggles_null_checks_before_type_dispatch() {
        let spec = FilterSpec::new(FieldType::Numeric).with_column("score");
        assert_eq!(
            run(spec.clone(), json!({"empty": "true"})),
            vec![Condition::IsNull {
                column: "score".into()
            }]
        );
        assert_eq!(
            run(spec, json!({"empty": "0"})),
            vec![Condition::IsNotNull {
                column: "score".into()
            }]
        );
    }

    #[test]
    fn test_unmapped_field_uses_its_name() {
        let spec = FilterSpec::new(FieldType::Number);
        assert_eq!(
            run(spec, json!(1)),
            vec![cmp("field", Comparison::Eq, Scalar::Int(1))]
        );
    }
}
