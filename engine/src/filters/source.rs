//! Filter sources
//!
//! Where the raw filter dictionary and sort directive come from: either a
//! request query string (`filters[score][gte]=5&sortBy[]=name`) or a value
//! supplied programmatically.

use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::sort::{SortBy, SortDesc};
use super::value::{RawFilterValue, RawFilters, Scalar};

/// Raw filter snapshot consumed by the engine
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterInput {
    #[serde(default)]
    pub filters: Option<RawFilters>,
    #[serde(default)]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub sort_desc: Option<SortDesc>,
}

impl FilterInput {
    pub fn local(filters: RawFilters, sort_by: Option<SortBy>, sort_desc: Option<SortDesc>) -> Self {
        Self {
            filters: Some(filters),
            sort_by,
            sort_desc,
        }
    }

    /// Decode a programmatic filter description
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Anything that can produce a filter snapshot
pub trait FilterSource {
    fn filters(&self) -> FilterInput;
}

impl FilterSource for FilterInput {
    fn filters(&self) -> FilterInput {
        self.clone()
    }
}

const FILTERS_KEY: &str = "filters";
const SORT_BY_KEY: &str = "sortBy";
const SORT_DESC_KEY: &str = "sortDesc";

/// Filter snapshot decoded from request query parameters
///
/// Supports bracket notation: `filters[name]=v`, `filters[name][]=v`,
/// `filters[name][op]=v`, `sortBy=f` / `sortBy[]=f` and
/// `sortDesc=true` / `sortDesc[]=true`. Other parameters are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    input: FilterInput,
}

impl QueryParams {
    /// Parse a raw (percent-encoded) query string, with or without a leading `?`
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Build from already-decoded key/value pairs, in order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = FilterInput::default();
        for (key, value) in pairs {
            let (base, path) = split_key(key.as_ref());
            let value = Scalar::Text(value.into());
            match base {
                FILTERS_KEY => insert_filter(&mut input, &path, value),
                SORT_BY_KEY => insert_sort_by(&mut input, &path, value),
                SORT_DESC_KEY => insert_sort_desc(&mut input, &path, value),
                _ => {}
            }
        }
        Self { input }
    }
}

impl FilterSource for QueryParams {
    fn filters(&self) -> FilterInput {
        self.input.clone()
    }
}

/// `a[b][]` -> (`a`, [`b`, ``]); unterminated brackets stay in the base
fn split_key(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    let (base, mut rest) = key.split_at(open);
    let mut path = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return (key, Vec::new());
        };
        path.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }
    (base, path)
}

fn insert_filter(input: &mut FilterInput, path: &[&str], value: Scalar) {
    let filters = input.filters.get_or_insert_with(RawFilters::default);
    match path {
        [name] if !name.is_empty() => {
            filters.insert(name.to_string(), RawFilterValue::Scalar(value));
        }
        [name, key] if !name.is_empty() => {
            let entry = filters
                .entry(name.to_string())
                .or_insert_with(|| RawFilterValue::List(Vec::new()));
            if key.is_empty() {
                entry.push(value);
            } else {
                entry.insert(key.to_string(), value);
            }
        }
        _ => tracing::trace!(path = ?path, "Ignoring unsupported filter parameter"),
    }
}

fn insert_sort_by(input: &mut FilterInput, path: &[&str], value: Scalar) {
    let field = value.to_text();
    match (path, input.sort_by.as_mut()) {
        ([], _) => input.sort_by = Some(SortBy::One(field)),
        ([_], Some(SortBy::Many(fields))) => fields.push(field),
        ([_], _) => input.sort_by = Some(SortBy::Many(vec![field])),
        _ => tracing::trace!(path = ?path, "Ignoring unsupported sortBy parameter"),
    }
}

fn insert_sort_desc(input: &mut FilterInput, path: &[&str], value: Scalar) {
    match (path, input.sort_desc.as_mut()) {
        ([], _) => input.sort_desc = Some(SortDesc::Flag(value)),
        ([_], Some(SortDesc::Flags(flags))) => flags.push(value),
        ([_], _) => input.sort_desc = Some(SortDesc::Flags(vec![value])),
        _ => tracing::trace!(path = ?path, "Ignoring unsupported sortDesc parameter"),
    }
}
