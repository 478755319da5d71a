//! Sort resolution
//!
//! Merges the client's sort request with the entity's default ordering,
//! expands multi-column sort fields and applies per-column sort formats.

use serde::{Deserialize, Serialize};

use super::builder::{Direction, QueryBuilder};
use super::definition::{FilterDefinition, SortFormat};
use super::value::Scalar;

/// Requested sort field(s)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SortBy {
    One(String),
    Many(Vec<String>),
}

impl SortBy {
    /// Requested field names with their position in the request.
    ///
    /// Blank names are skipped but keep their slot, so `sortDesc` flags
    /// still line up by index.
    pub fn fields(&self) -> Vec<(usize, String)> {
        match self {
            Self::One(field) => vec![field.clone()],
            Self::Many(fields) => fields.clone(),
        }
        .into_iter()
        .enumerate()
        .filter(|(_, f)| !f.is_empty())
        .collect()
    }
}

impl From<&str> for SortBy {
    fn from(field: &str) -> Self {
        Self::One(field.to_string())
    }
}

/// Descending flag(s) accompanying [`SortBy`]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SortDesc {
    /// One flag per requested field, by index
    Flags(Vec<Scalar>),
    /// Shared by every requested field and by remaining defaults
    Flag(Scalar),
}

/// Only a literal `"true"` (or native `true`) means descending
fn flag_direction(flag: &Scalar) -> Direction {
    match flag {
        Scalar::Bool(true) => Direction::Desc,
        Scalar::Text(s) if s == "true" => Direction::Desc,
        _ => Direction::Asc,
    }
}

pub(crate) struct SortResolver<'a, F> {
    pub definition: &'a FilterDefinition,
    /// Fields with a registered override sort on their own name
    pub is_override: F,
}

impl<F: Fn(&str) -> bool> SortResolver<'_, F> {
    pub fn apply<B: QueryBuilder>(
        &self,
        builder: B,
        sort_by: Option<&SortBy>,
        sort_desc: Option<&SortDesc>,
    ) -> B {
        let requested = sort_by.map(SortBy::fields).unwrap_or_default();

        let (plan, shared) = if requested.is_empty() {
            (self.definition.default_sort().to_vec(), None)
        } else {
            let plan: Vec<(String, Direction)> = requested
                .into_iter()
                .map(|(idx, field)| {
                    let direction = match sort_desc {
                        None => Direction::Asc,
                        Some(SortDesc::Flag(flag)) => flag_direction(flag),
                        Some(SortDesc::Flags(flags)) => {
                            flags.get(idx).map_or(Direction::Asc, flag_direction)
                        }
                    };
                    (field, direction)
                })
                .collect();
            // A per-index list leaves defaults on their own directions
            let shared = match sort_desc {
                Some(SortDesc::Flags(_)) => None,
                Some(SortDesc::Flag(flag)) => Some(flag_direction(flag)),
                None => Some(Direction::Asc),
            };
            (plan, shared)
        };

        tracing::debug!(plan = ?plan, shared = ?shared, "Resolved sort");

        let builder = plan
            .iter()
            .fold(builder, |b, (field, direction)| {
                self.order_field(b, field, *direction)
            });

        self.definition
            .default_sort()
            .iter()
            .filter(|(field, _)| !plan.iter().any(|(planned, _)| planned == field))
            .fold(builder, |b, (field, direction)| {
                self.order_field(b, field, shared.unwrap_or(*direction))
            })
    }

    fn order_field<B: QueryBuilder>(&self, builder: B, field: &str, direction: Direction) -> B {
        if (self.is_override)(field) {
            return self.emit(builder, field, direction);
        }
        match self.definition.registry().lookup(field) {
            None => self.emit(builder, field, direction),
            Some(spec) => match spec.sort_columns() {
                Some(columns) => columns
                    .into_iter()
                    .fold(builder, |b, column| self.emit(b, column, direction)),
                None => self.emit(builder, spec.column_or(field), direction),
            },
        }
    }

    fn emit<B: QueryBuilder>(&self, builder: B, column: &str, direction: Direction) -> B {
        match self.definition.sort_format(column) {
            SortFormat::Default => builder.order_by(column, direction),
            SortFormat::Date => builder.order_by_date(column, direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builder::{OrderBy, RecordingBuilder};
    use crate::filters::definition::{FieldType, FilterSpec};

    fn col(column: &str, direction: Direction) -> OrderBy {
        OrderBy::Column {
            column: column.into(),
            direction,
        }
    }

    fn definition() -> FilterDefinition {
        FilterDefinition::builder()
            .field("name", FilterSpec::new(FieldType::Text).with_column("full_name"))
            .field(
                "location",
                FilterSpec::new(FieldType::Text)
                    .with_column("city")
                    .with_sort_map("city,region"),
            )
            .field("seen", FilterSpec::new(FieldType::Datetime).with_column("seen_at"))
            .default_sort("created_at", Direction::Desc)
            .default_sort("id", Direction::Asc)
            .sort_format("seen_at", SortFormat::Date)
            .build()
            .unwrap()
    }

    fn resolve(
        def: &FilterDefinition,
        sort_by: Option<SortBy>,
        sort_desc: Option<SortDesc>,
    ) -> Vec<OrderBy> {
        let resolver = SortResolver {
            definition: def,
            is_override: |name: &str| name == "custom",
        };
        resolver
            .apply(
                RecordingBuilder::default(),
                sort_by.as_ref(),
                sort_desc.as_ref(),
            )
            .orderings
    }

    #[test]
    fn test_defaults_apply_when_nothing_requested() {
        let def = definition();
        assert_eq!(
            resolve(&def, None, Some(SortDesc::Flag("true".into()))),
            vec![
                col("created_at", Direction::Desc),
                col("id", Direction::Asc)
            ]
        );
        assert_eq!(
            resolve(&def, Some(SortBy::Many(vec![])), None),
            vec![
                col("created_at", Direction::Desc),
                col("id", Direction::Asc)
            ]
        );
    }

    #[test]
    fn test_per_index_flags_keep_default_directions() {
        let def = definition();
        assert_eq!(
            resolve(
                &def,
                Some(SortBy::Many(vec!["name".into()])),
                Some(SortDesc::Flags(vec!["true".into()]))
            ),
            vec![
                col("full_name", Direction::Desc),
                col("created_at", Direction::Desc),
                col("id", Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_shared_flag_overrides_default_directions() {
        let def = definition();
        assert_eq!(
            resolve(&def, Some("name".into()), Some(SortDesc::Flag("true".into()))),
            vec![
                col("full_name", Direction::Desc),
                col("created_at", Direction::Desc),
                col("id", Direction::Desc),
            ]
        );
        // Absent flag counts as a shared ascending direction
        assert_eq!(
            resolve(&def, Some("name".into()), None),
            vec![
                col("full_name", Direction::Asc),
                col("created_at", Direction::Asc),
                col("id", Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_missing_or_non_true_flags_are_ascending() {
        let def = definition();
        let orderings = resolve(
            &def,
            Some(SortBy::Many(vec!["a".into(), "b".into(), "c".into()])),
            Some(SortDesc::Flags(vec!["false".into(), "TRUE".into()])),
        );
        assert_eq!(
            &orderings[..3],
            &[
                col("a", Direction::Asc),
                col("b", Direction::Asc),
                col("c", Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_blank_sort_fields_keep_flag_positions() {
        let def = definition();
        let orderings = resolve(
            &def,
            Some(SortBy::Many(vec!["".into(), "name".into()])),
            Some(SortDesc::Flags(vec!["false".into(), "true".into()])),
        );
        assert_eq!(orderings[0], col("full_name", Direction::Desc));
        assert_eq!(orderings.len(), 3);
    }

    #[test]
    fn test_sort_map_expands_in_order() {
        let def = definition();
        let orderings = resolve(
            &def,
            Some("location".into()),
            Some(SortDesc::Flag(Scalar::Bool(true))),
        );
        assert_eq!(
            &orderings[..2],
            &[col("city", Direction::Desc), col("region", Direction::Desc)]
        );
    }

    #[test]
    fn test_requested_default_is_not_duplicated() {
        let def = definition();
        assert_eq!(
            resolve(
                &def,
                Some(SortBy::Many(vec!["id".into()])),
                Some(SortDesc::Flags(vec!["true".into()]))
            ),
            vec![col("id", Direction::Desc), col("created_at", Direction::Desc)]
        );
    }

    #[test]
    fn test_override_fields_sort_on_their_name() {
        let def = definition();
        let orderings = resolve(&def, Some("custom".into()), None);
        assert_eq!(orderings[0], col("custom", Direction::Asc));
    }

    #[test]
    fn test_date_format_truncates_column() {
        let def = definition();
        let orderings = resolve(&def, Some("seen".into()), None);
        assert_eq!(
            orderings[0],
            OrderBy::Date {
                column: "seen_at".into(),
                direction: Direction::Asc
            }
        );
    }

    #[test]
    fn test_sort_desc_deserializes_both_shapes() {
        let flags: SortDesc = serde_json::from_str(r#"["true", "false"]"#).unwrap();
        assert!(matches!(flags, SortDesc::Flags(v) if v.len() == 2));
        let flag: SortDesc = serde_json::from_str("true").unwrap();
        assert_eq!(flag, SortDesc::Flag(Scalar::Bool(true)));
    }
}
