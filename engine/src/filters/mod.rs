//! Filter engine
//!
//! Translates a loosely typed filter dictionary and sort directive into
//! predicates and orderings on a [`QueryBuilder`], driven by a declarative
//! per-entity [`FilterDefinition`].
//!
//! ```ignore
//! let definition = FilterDefinition::load(Path::new("users.json"))?;
//! let params = QueryParams::parse("filters[status]=active&sortBy[]=name");
//! let query = QueryFilter::from_source(&definition, &params)
//!     .apply_filters_and_sorting(SqlQuery::new(Backend::Postgres));
//! ```

mod builder;
mod coerce;
mod definition;
mod engine;
mod error;
mod operator;
mod search;
mod sort;
mod source;
mod truthy;
mod value;

pub use builder::{Condition, Direction, OrderBy, QueryBuilder, RecordingBuilder};
pub use definition::{
    DEFAULT_IDENTITY_FIELD, FieldType, FilterDefinition, FilterDefinitionBuilder, FilterRegistry,
    FilterSpec, SortFormat,
};
pub use engine::{FieldOverride, QueryFilter, SEARCH_FIELD};
pub use error::FilterError;
pub use operator::{Comparison, Operator};
pub use sort::{SortBy, SortDesc};
pub use source::{FilterInput, FilterSource, QueryParams};
pub use truthy::{DEFAULT_TRUTHY_TOKENS, TruthyTokens};
pub use value::{FilterEntry, RawFilterValue, RawFilters, Scalar};
