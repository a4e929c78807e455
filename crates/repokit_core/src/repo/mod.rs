//! Repository layer: generic contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define entity-agnostic data access contracts.
//! - Isolate SQL text and row hydration from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Criteria`) in
//!   addition to DB transport errors.

pub mod base_repo;
mod eager;
pub mod error;
pub mod page;
pub mod soft_deletes;

pub use base_repo::{Repository, SqliteRepository};
pub use error::{RepoError, RepoResult};
pub use page::Page;
pub use soft_deletes::SoftDeletesRepository;
