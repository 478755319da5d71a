//! Parameterised SQL query builder
//!
//! Renders filter conditions and orderings into `WHERE` / `ORDER BY`
//! fragments for one backend, collecting bound values in order.
//!
//! # SQL Injection Safety
//! Every value is bound as a parameter. Column names are spliced into the
//! SQL text, so any that is not a plain identifier is dropped with a warning.
//! Raw predicates are trusted as-is; only their `?` markers are renumbered.

use super::Backend;
use crate::filters::{Condition, OrderBy, QueryBuilder, Scalar};
use crate::utils::sql::{escape_like_pattern, is_safe_identifier};

#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    backend: Backend,
    conditions: Vec<String>,
    orderings: Vec<String>,
    params: Vec<Scalar>,
}

impl SqlQuery {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            conditions: Vec::new(),
            orderings: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Rendered predicates, ANDed together in the WHERE clause
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn orderings(&self) -> &[String] {
        &self.orderings
    }

    /// Parameter values in placeholder order
    pub fn params(&self) -> &[Scalar] {
        &self.params
    }

    /// WHERE clause without the keyword, `None` when unfiltered
    pub fn to_where_clause(&self) -> Option<String> {
        (!self.conditions.is_empty()).then(|| self.conditions.join(" AND "))
    }

    /// ORDER BY clause without the keyword, `None` when unordered
    pub fn to_order_clause(&self) -> Option<String> {
        (!self.orderings.is_empty()).then(|| self.orderings.join(", "))
    }

    /// Append the WHERE and ORDER BY clauses to `base`
    pub fn to_sql(&self, base: &str) -> String {
        let mut sql = base.trim_end().to_string();
        if let Some(clause) = self.to_where_clause() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        if let Some(clause) = self.to_order_clause() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&clause);
        }
        sql
    }

    fn bind(&mut self, value: Scalar) -> String {
        self.params.push(value);
        self.backend.dialect().placeholder(self.params.len())
    }

    fn render(&mut self, condition: Condition) -> Option<String> {
        let dialect = self.backend.dialect();
        let sql = match condition {
            Condition::Compare { column, op, value } => {
                let column = checked(&column)?;
                match value {
                    Scalar::Bool(flag) => {
                        format!("{} {} {}", column, op, dialect.bool_literal(flag))
                    }
                    value => format!("{} {} {}", column, op, self.bind(value)),
                }
            }
            Condition::CompareDate { column, op, value } => {
                let column = checked(&column)?;
                let placeholder = self.bind(value);
                format!(
                    "{} {} {}",
                    dialect.cast_to_date(column),
                    op,
                    dialect.cast_to_date(&placeholder)
                )
            }
            Condition::CompareLower { column, op, value } => {
                let column = checked(&column)?;
                let placeholder = self.bind(Scalar::Text(value));
                format!("{} {} {}", dialect.lower(column), op, placeholder)
            }
            Condition::Contains { column, needle } => {
                let column = checked(&column)?;
                let pattern = format!("%{}%", escape_like_pattern(&needle));
                let placeholder = self.bind(Scalar::Text(pattern));
                format!(
                    "{} LIKE {}{}",
                    dialect.lower(&dialect.cast_to_string(column)),
                    placeholder,
                    dialect.like_escape()
                )
            }
            Condition::In { column, values } => {
                let column = checked(&column)?;
                if values.is_empty() {
                    return Some("1 = 0".to_string());
                }
                let placeholders: Vec<String> =
                    values.into_iter().map(|value| self.bind(value)).collect();
                format!("{} IN ({})", column, placeholders.join(", "))
            }
            Condition::IsNull { column } => format!("{} IS NULL", checked(&column)?),
            Condition::IsNotNull { column } => format!("{} IS NOT NULL", checked(&column)?),
            Condition::Raw { sql, bindings } => self.renumber(&sql, bindings),
            Condition::Any(group) => {
                let parts: Vec<String> = group
                    .into_iter()
                    .filter_map(|condition| self.render(condition))
                    .collect();
                match parts.len() {
                    0 => return None,
                    1 => parts.into_iter().next()?,
                    _ => format!("({})", parts.join(" OR ")),
                }
            }
        };
        Some(sql)
    }

    /// Swap each `?` for this backend's placeholder, binding as it goes
    fn renumber(&mut self, sql: &str, bindings: Vec<Scalar>) -> String {
        let mut bindings = bindings.into_iter();
        let mut out = String::with_capacity(sql.len());
        for ch in sql.chars() {
            if ch == '?'
                && let Some(value) = bindings.next()
            {
                out.push_str(&self.bind(value));
            } else {
                out.push(ch);
            }
        }
        if bindings.len() > 0 {
            tracing::warn!(
                extra = bindings.len(),
                "Raw predicate has more bindings than placeholders"
            );
        }
        out
    }
}

impl QueryBuilder for SqlQuery {
    fn filter(mut self, condition: Condition) -> Self {
        if let Some(sql) = self.render(condition) {
            self.conditions.push(sql);
        }
        self
    }

    fn order(mut self, order: OrderBy) -> Self {
        let (column, direction, by_date) = match &order {
            OrderBy::Column { column, direction } => (column, *direction, false),
            OrderBy::Date { column, direction } => (column, *direction, true),
        };
        let Some(column) = checked(column) else {
            return self;
        };
        let expr = if by_date {
            self.backend.dialect().cast_to_date(column)
        } else {
            column.to_string()
        };
        self.orderings.push(format!("{} {}", expr, direction.as_str()));
        self
    }
}

fn checked(column: &str) -> Option<&str> {
    if is_safe_identifier(column) {
        Some(column)
    } else {
        tracing::warn!(column, "Dropping clause with unsafe column identifier");
        None
    }
}
