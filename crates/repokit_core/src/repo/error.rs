//! Repository error model.
//!
//! # Invariants
//! - Criteria defects stay distinguishable from storage failures, so callers
//!   can map them to "bad request" vs "internal" without string matching.

use crate::criteria::error::CriteriaError;
use crate::db::DbError;
use crate::model::schema::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by repository and service operations.
#[derive(Debug)]
pub enum RepoError {
    Criteria(CriteriaError),
    /// No row matched; `id` is set for primary-key lookups.
    NotFound {
        entity: &'static str,
        id: Option<EntityId>,
    },
    Db(DbError),
    InvalidData(String),
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    SoftDeletesUnsupported(&'static str),
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: Option<EntityId>) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Criteria(err) => write!(f, "{err}"),
            Self::NotFound {
                entity,
                id: Some(id),
            } => write!(f, "{entity} not found: {id}"),
            Self::NotFound { entity, id: None } => {
                write!(f, "no {entity} matches the given criteria")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UnknownColumn { table, column } => {
                write!(f, "cannot write unknown column `{column}` on `{table}`")
            }
            Self::SoftDeletesUnsupported(table) => {
                write!(f, "table `{table}` has no archive column")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Criteria(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::InvalidData(_)
            | Self::UnknownColumn { .. }
            | Self::SoftDeletesUnsupported(_) => None,
        }
    }
}

impl From<CriteriaError> for RepoError {
    fn from(value: CriteriaError) -> Self {
        Self::Criteria(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
