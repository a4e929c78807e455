//! Query criteria: descriptor, operators and the applier.
//!
//! # Responsibility
//! - Describe one read (`QueryParameters`) independently of storage.
//! - Translate that description into `SelectQuery` constraints.
//!
//! # Invariants
//! - Every criteria defect is reported as `CriteriaError` before any
//!   statement reaches SQLite.

pub mod apply;
pub mod error;
pub mod params;
pub mod parse;
pub mod path;
pub mod rule;
