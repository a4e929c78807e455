//! Parameterized SQL building for entity reads.

pub mod select;
