//! Storage-facing data shapes shared by criteria, repositories and services.
//!
//! # Responsibility
//! - Define the scalar value, row and write-map types.
//! - Define the static schema registry entities are described by.
//!
//! # Invariants
//! - Every entity is identified by an `EntityId` primary key.
//! - Archived state lives in the schema's soft-delete column, never in a
//!   separate table.

pub mod record;
pub mod schema;
pub mod value;
