//! Use-case services over repositories.
//!
//! # Responsibility
//! - Give callers one entry point per entity, storage details hidden.
//! - Own the transaction boundary for writes.

pub mod base_service;

pub use base_service::{BaseService, SqliteService};
