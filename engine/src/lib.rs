//! Query filter engine
//!
//! Turns loosely typed request filters (`filters[score][gte]=5`,
//! `sortBy[]=name`) into predicates and orderings on a query builder,
//! driven by a declarative per-entity field definition.

pub mod app;
pub mod core;
pub mod data;
pub mod filters;
pub mod utils;
