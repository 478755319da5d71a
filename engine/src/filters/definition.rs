//! Entity filter definitions
//!
//! A [`FilterDefinition`] is everything an entity declares about how it can
//! be filtered and sorted: the per-field [`FilterSpec`] registry, the default
//! ordering, per-column sort formats, the fast-search field set and the
//! identity field. It is built once and never mutated afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::builder::Direction;
use super::engine::SEARCH_FIELD;
use super::error::FilterError;
use super::operator::Operator;
use super::truthy::TruthyTokens;

/// Identity field used by free-text search unless the entity names another
pub const DEFAULT_IDENTITY_FIELD: &str = "id";

/// Declared field type, selects the coercion strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    StrictText,
    Number,
    NumberOr,
    Numeric,
    Percent,
    Bool,
    BoolRaw,
    Date,
    Datetime,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::StrictText => "strict-text",
            Self::Number => "number",
            Self::NumberOr => "number-or",
            Self::Numeric => "numeric",
            Self::Percent => "percent",
            Self::Bool => "bool",
            Self::BoolRaw => "bool-raw",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Array => "array",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::StrictText)
    }
}

/// Per-field filter metadata
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Target column; a comma-separated list for `number-or`
    #[serde(default, alias = "map", skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Operator applied when the client does not send one
    #[serde(default, alias = "operation", skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Comma-separated columns a sort on this field expands into
    #[serde(default, alias = "sortMap", skip_serializing_if = "Option::is_none")]
    pub sort_map: Option<String>,
}

impl FilterSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            column: None,
            operator: None,
            step: None,
            sort_map: None,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_sort_map(mut self, columns: impl Into<String>) -> Self {
        self.sort_map = Some(columns.into());
        self
    }

    /// Mapped column, falling back to the field name
    pub fn column_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.column.as_deref().unwrap_or(name)
    }

    /// Bucket width for range matching; percent is fixed at 0.01
    pub fn bucket_step(&self) -> f64 {
        match self.field_type {
            FieldType::Percent => 0.01,
            _ => self.step.unwrap_or(1.0),
        }
    }

    pub fn sort_columns(&self) -> Option<Vec<&str>> {
        self.sort_map
            .as_deref()
            .map(|cols| cols.split(',').map(str::trim).collect())
    }

    fn validate(&self, name: &str) -> Result<(), FilterError> {
        if let Some(column) = &self.column {
            if column.split(',').any(|c| c.trim().is_empty()) {
                return Err(FilterError::invalid_definition(name, "empty column name"));
            }
            if column.contains(',') && self.field_type != FieldType::NumberOr {
                return Err(FilterError::invalid_definition(
                    name,
                    "only number-or fields may map to several columns",
                ));
            }
        } else if self.field_type == FieldType::NumberOr {
            return Err(FilterError::invalid_definition(
                name,
                "number-or fields need a column list",
            ));
        }

        if let Some(step) = self.step
            && !(step.is_finite() && step > 0.0)
        {
            return Err(FilterError::invalid_definition(
                name,
                format!("step must be a positive number, got {}", step),
            ));
        }

        if let Some(cols) = self.sort_columns()
            && cols.iter().any(|c| c.is_empty())
        {
            return Err(FilterError::invalid_definition(name, "empty sort column"));
        }

        Ok(())
    }
}

/// How an ordering clause is emitted for a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortFormat {
    #[default]
    Default,
    /// Order by the calendar date only
    Date,
}

/// Read-only `name -> FilterSpec` lookup, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRegistry {
    specs: IndexMap<String, FilterSpec>,
}

impl FilterRegistry {
    pub fn lookup(&self, name: &str) -> Option<&FilterSpec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterSpec)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<(String, FilterSpec)> for FilterRegistry {
    fn from_iter<T: IntoIterator<Item = (String, FilterSpec)>>(iter: T) -> Self {
        Self {
            specs: iter.into_iter().collect(),
        }
    }
}

/// Filter and sort declaration for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDefinition {
    registry: FilterRegistry,
    default_sort: Vec<(String, Direction)>,
    sort_formats: HashMap<String, SortFormat>,
    fast_search: Vec<String>,
    identity_field: String,
    truthy: TruthyTokens,
}

impl FilterDefinition {
    pub fn builder() -> FilterDefinitionBuilder {
        FilterDefinitionBuilder::default()
    }

    /// Load a definition from a JSON file
    pub fn load(path: &Path) -> Result<Self, FilterError> {
        tracing::debug!(path = %path.display(), "Loading filter definition");
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let file: DefinitionFile = serde_json::from_str(json)?;
        file.warn_unknown_fields();
        file.into_definition()
    }

    /// Replace the truthy-token set used for boolean coercion
    pub fn with_truthy_tokens(mut self, truthy: TruthyTokens) -> Self {
        self.truthy = truthy;
        self
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn default_sort(&self) -> &[(String, Direction)] {
        &self.default_sort
    }

    pub fn sort_format(&self, column: &str) -> SortFormat {
        self.sort_formats.get(column).copied().unwrap_or_default()
    }

    pub fn fast_search(&self) -> &[String] {
        &self.fast_search
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    pub fn truthy(&self) -> &TruthyTokens {
        &self.truthy
    }

    fn validate(&self) -> Result<(), FilterError> {
        for (name, spec) in self.registry.iter() {
            if name == SEARCH_FIELD {
                return Err(FilterError::invalid_definition(
                    name,
                    "field name is reserved for free-text search",
                ));
            }
            spec.validate(name)?;
        }

        if let Some(name) = self
            .fast_search
            .iter()
            .find(|name| !self.registry.contains(name))
        {
            return Err(FilterError::invalid_definition(
                name.as_str(),
                "fast-search field is not declared",
            ));
        }

        if self.identity_field.trim().is_empty() {
            return Err(FilterError::invalid_definition(
                "identity_field",
                "must not be empty",
            ));
        }

        Ok(())
    }
}

/// Builder for entity definitions declared in code
#[derive(Debug, Default)]
pub struct FilterDefinitionBuilder {
    specs: IndexMap<String, FilterSpec>,
    default_sort: Vec<(String, Direction)>,
    sort_formats: HashMap<String, SortFormat>,
    fast_search: Vec<String>,
    identity_field: Option<String>,
    truthy: Option<TruthyTokens>,
}

impl FilterDefinitionBuilder {
    pub fn field(mut self, name: impl Into<String>, spec: FilterSpec) -> Self {
        self.specs.insert(name.into(), spec);
        self
    }

    pub fn default_sort(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.default_sort.push((field.into(), direction));
        self
    }

    pub fn sort_format(mut self, column: impl Into<String>, format: SortFormat) -> Self {
        self.sort_formats.insert(column.into(), format);
        self
    }

    pub fn fast_search<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fast_search.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn identity_field(mut self, name: impl Into<String>) -> Self {
        self.identity_field = Some(name.into());
        self
    }

    pub fn truthy_tokens(mut self, truthy: TruthyTokens) -> Self {
        self.truthy = Some(truthy);
        self
    }

    pub fn build(self) -> Result<FilterDefinition, FilterError> {
        let definition = FilterDefinition {
            registry: FilterRegistry { specs: self.specs },
            default_sort: self.default_sort,
            sort_formats: self.sort_formats,
            fast_search: self.fast_search,
            identity_field: self
                .identity_field
                .unwrap_or_else(|| DEFAULT_IDENTITY_FIELD.to_string()),
            truthy: self.truthy.unwrap_or_default(),
        };
        definition.validate()?;
        tracing::trace!(
            fields = definition.registry.len(),
            fast_search = definition.fast_search.len(),
            "Filter definition built"
        );
        Ok(definition)
    }
}

/// On-disk JSON shape of a definition
#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    fields: IndexMap<String, FilterSpec>,
    #[serde(default, alias = "defaultSort")]
    default_sort: IndexMap<String, Direction>,
    #[serde(default, alias = "sortFormats", alias = "formatSort")]
    sort_formats: HashMap<String, SortFormat>,
    #[serde(default, alias = "fastSearch")]
    fast_search: Vec<String>,
    #[serde(default, alias = "identityField")]
    identity_field: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Value,
}

impl DefinitionFile {
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in filter definition (possible typos)"
            );
        }
    }

    fn into_definition(self) -> Result<FilterDefinition, FilterError> {
        let mut builder = FilterDefinition::builder().fast_search(self.fast_search);
        for (name, spec) in self.fields {
            builder = builder.field(name, spec);
        }
        for (field, direction) in self.default_sort {
            builder = builder.default_sort(field, direction);
        }
        for (column, format) in self.sort_formats {
            builder = builder.sort_format(column, format);
        }
        if let Some(identity) = self.identity_field {
            builder = builder.identity_field(identity);
        }
        builder.build()
    }
}
