//! Criteria error taxonomy.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed criteria, detected before any statement is prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    UnknownOperator(String),
    InvalidOperand {
        operator: &'static str,
        expected: &'static str,
    },
    UnknownRelation {
        entity: &'static str,
        relation: String,
        path: String,
    },
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    InvalidPath(String),
    InvalidDirection(String),
    InvalidDate(String),
    InvalidPageSize(u64),
    InvalidShape(String),
}

impl Display for CriteriaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOperator(token) => write!(f, "unknown criteria operator `{token}`"),
            Self::InvalidOperand { operator, expected } => {
                write!(f, "operator `{operator}` expects {expected}")
            }
            Self::UnknownRelation {
                entity,
                relation,
                path,
            } => write!(
                f,
                "entity `{entity}` has no relation `{relation}` (path `{path}`)"
            ),
            Self::UnknownColumn { table, column } => {
                write!(f, "table `{table}` has no column `{column}`")
            }
            Self::InvalidPath(path) => write!(f, "invalid field path `{path}`"),
            Self::InvalidDirection(direction) => {
                write!(f, "invalid sort direction `{direction}`; expected asc|desc")
            }
            Self::InvalidDate(value) => {
                write!(f, "invalid date operand `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidPageSize(size) => write!(f, "page size must be >= 1, got {size}"),
            Self::InvalidShape(message) => write!(f, "malformed criteria: {message}"),
        }
    }
}

impl Error for CriteriaError {}

pub type CriteriaResult<T> = Result<T, CriteriaError>;
