//! Filter orchestrator
//!
//! Walks the raw filter dictionary, routing each field to its override,
//! the generic type coercer or the search dispatcher, then drives the sort
//! resolver. The builder is threaded through every step by value.

use std::collections::HashMap;
use std::fmt;

use super::builder::QueryBuilder;
use super::coerce::FieldCoercer;
use super::definition::FilterDefinition;
use super::search::apply_search;
use super::sort::{SortBy, SortDesc, SortResolver};
use super::source::{FilterInput, FilterSource};
use super::value::{RawFilters, Scalar};

/// Reserved filter name for free-text search
pub const SEARCH_FIELD: &str = "search";

/// Bespoke handling for a single field; receives the non-blank values
pub type FieldOverride<B> = Box<dyn Fn(B, &[Scalar]) -> B>;

/// Per-request filter engine for one entity definition
pub struct QueryFilter<'d, B> {
    definition: &'d FilterDefinition,
    overrides: HashMap<String, FieldOverride<B>>,
    input: FilterInput,
}

impl<'d, B: QueryBuilder> QueryFilter<'d, B> {
    pub fn new(definition: &'d FilterDefinition) -> Self {
        Self {
            definition,
            overrides: HashMap::new(),
            input: FilterInput::default(),
        }
    }

    /// Engine pre-loaded with a snapshot taken from `source`
    pub fn from_source(definition: &'d FilterDefinition, source: &impl FilterSource) -> Self {
        let mut filter = Self::new(definition);
        filter.input = source.filters();
        filter
    }

    /// Register an override for `name`. Generic coercion still runs for
    /// registered fields; sorting on `name` uses the name as the column.
    pub fn with_override<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(B, &[Scalar]) -> B + 'static,
    {
        self.overrides.insert(name.into(), Box::new(f));
        self
    }

    /// Replace the snapshot with a programmatic one
    pub fn set_local_filters(
        &mut self,
        filters: RawFilters,
        sort_by: Option<SortBy>,
        sort_desc: Option<SortDesc>,
    ) -> &mut Self {
        self.input = FilterInput::local(filters, sort_by, sort_desc);
        self
    }

    pub fn filters(&self) -> &FilterInput {
        &self.input
    }

    pub fn definition(&self) -> &FilterDefinition {
        self.definition
    }

    pub fn apply_filters(&self, builder: B) -> B {
        let Some(filters) = self.input.filters.as_ref().filter(|f| !f.is_empty()) else {
            return builder;
        };

        filters.iter().fold(builder, |builder, (name, raw)| {
            if name == SEARCH_FIELD {
                return apply_search(builder, self.definition, raw);
            }

            let builder = match self.overrides.get(name) {
                Some(handler) => {
                    tracing::trace!(field = %name, "Applying field override");
                    handler(builder, &raw.non_blank_values())
                }
                None => builder,
            };

            match self.definition.registry().lookup(name) {
                Some(spec) => FieldCoercer {
                    name,
                    spec,
                    truthy: self.definition.truthy(),
                }
                .apply(builder, raw),
                None => {
                    tracing::trace!(field = %name, "Ignoring unregistered filter");
                    builder
                }
            }
        })
    }

    pub fn apply_sort(&self, builder: B) -> B {
        SortResolver {
            definition: self.definition,
            is_override: |name: &str| self.overrides.contains_key(name),
        }
        .apply(
            builder,
            self.input.sort_by.as_ref(),
            self.input.sort_desc.as_ref(),
        )
    }

    pub fn apply_filters_and_sorting(&self, builder: B) -> B {
        let builder = self.apply_filters(builder);
        self.apply_sort(builder)
    }
}

impl<B> fmt::Debug for QueryFilter<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFilter")
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}
