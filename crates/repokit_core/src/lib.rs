//! Generic data-access layer over SQLite.
//!
//! Callers describe reads with [`QueryParameters`], run them through a
//! [`Repository`], and mutate through a [`BaseService`] that wraps every
//! write in a transaction.

pub mod config;
pub mod criteria;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{DatabaseConfig, PaginationDefaults};
pub use criteria::apply::apply_criteria;
pub use criteria::error::{CriteriaError, CriteriaResult};
pub use criteria::params::{Direction, Filter, QueryParameters, QueryParametersBuilder};
pub use criteria::rule::{Operator, Rule};
pub use db::{
    open_db, open_db_in_memory, open_db_with, DbError, DbResult, Migration, SqliteTransactions,
    TransactionRunner,
};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LoggingConfig};
pub use model::record::{Fields, Record};
pub use model::schema::{Entity, EntityId, Relation, RelationKind, SoftDeletable, TableSchema};
pub use model::value::SqlValue;
pub use query::select::{Scope, SelectQuery};
pub use repo::{Page, RepoError, RepoResult, Repository, SoftDeletesRepository, SqliteRepository};
pub use service::{BaseService, SqliteService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
