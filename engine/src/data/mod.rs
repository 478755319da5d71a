//! Data access layer
//!
//! - `sql` - SQL dialects and the parameterised query builder
//!   that filter output is rendered into

pub mod sql;
