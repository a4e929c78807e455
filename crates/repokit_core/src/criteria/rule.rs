//! Filter operators and their operand shapes.
//!
//! # Invariants
//! - Each `Rule` variant carries exactly the operand its operator needs, so
//!   shape errors can only come from untyped (token) input.
//! - `Operator` is the closed token set; `exists`/`not_exists` have no `Rule`
//!   variant because they filter on relations, not columns.

use crate::criteria::error::{CriteriaError, CriteriaResult};
use crate::model::value::SqlValue;
use std::fmt::{Display, Formatter};

/// Criteria operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Date,
    In,
    Between,
    Null,
    NotNull,
    Exists,
    NotExists,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Self::Eq,
        Self::NotEq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::Date,
        Self::In,
        Self::Between,
        Self::Null,
        Self::NotNull,
        Self::Exists,
        Self::NotExists,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::Date => "date",
            Self::In => "in",
            Self::Between => "between",
            Self::Null => "null",
            Self::NotNull => "not_null",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
        }
    }

    /// Parses an operator token, case-insensitively.
    pub fn parse(token: &str) -> CriteriaResult<Self> {
        let normalized = token.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|operator| operator.token() == normalized)
            .ok_or_else(|| CriteriaError::UnknownOperator(token.to_string()))
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// A column condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Eq(SqlValue),
    NotEq(SqlValue),
    Gt(SqlValue),
    Gte(SqlValue),
    Lt(SqlValue),
    Lte(SqlValue),
    /// Substring match; see [`Rule::like_pattern`].
    Like(String),
    /// Equality on the date portion of a timestamp, `YYYY-MM-DD`.
    Date(String),
    In(Vec<SqlValue>),
    /// Inclusive on both ends.
    Between(SqlValue, SqlValue),
    Null,
    NotNull,
}

impl Rule {
    pub fn eq(value: impl Into<SqlValue>) -> Self {
        Self::Eq(value.into())
    }

    pub fn ne(value: impl Into<SqlValue>) -> Self {
        Self::NotEq(value.into())
    }

    pub fn gt(value: impl Into<SqlValue>) -> Self {
        Self::Gt(value.into())
    }

    pub fn gte(value: impl Into<SqlValue>) -> Self {
        Self::Gte(value.into())
    }

    pub fn lt(value: impl Into<SqlValue>) -> Self {
        Self::Lt(value.into())
    }

    pub fn lte(value: impl Into<SqlValue>) -> Self {
        Self::Lte(value.into())
    }

    pub fn like(value: impl Into<String>) -> Self {
        Self::Like(value.into())
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self::Date(value.into())
    }

    pub fn is_in<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        Self::In(values.into_iter().map(Into::into).collect())
    }

    pub fn between(low: impl Into<SqlValue>, high: impl Into<SqlValue>) -> Self {
        Self::Between(low.into(), high.into())
    }

    pub fn null() -> Self {
        Self::Null
    }

    pub fn not_null() -> Self {
        Self::NotNull
    }

    pub fn operator(&self) -> Operator {
        match self {
            Self::Eq(_) => Operator::Eq,
            Self::NotEq(_) => Operator::NotEq,
            Self::Gt(_) => Operator::Gt,
            Self::Gte(_) => Operator::Gte,
            Self::Lt(_) => Operator::Lt,
            Self::Lte(_) => Operator::Lte,
            Self::Like(_) => Operator::Like,
            Self::Date(_) => Operator::Date,
            Self::In(_) => Operator::In,
            Self::Between(..) => Operator::Between,
            Self::Null => Operator::Null,
            Self::NotNull => Operator::NotNull,
        }
    }

    /// `LIKE` pattern for a substring match.
    ///
    /// Operands already carrying a `%` wildcard are used verbatim.
    pub fn like_pattern(operand: &str) -> String {
        if operand.contains('%') {
            operand.to_string()
        } else {
            format!("%{operand}%")
        }
    }
}

impl From<SqlValue> for Rule {
    fn from(value: SqlValue) -> Self {
        Self::Eq(value)
    }
}

impl From<&str> for Rule {
    fn from(value: &str) -> Self {
        Self::Eq(value.into())
    }
}

impl From<String> for Rule {
    fn from(value: String) -> Self {
        Self::Eq(value.into())
    }
}

impl From<i64> for Rule {
    fn from(value: i64) -> Self {
        Self::Eq(value.into())
    }
}

impl From<i32> for Rule {
    fn from(value: i32) -> Self {
        Self::Eq(value.into())
    }
}

impl From<f64> for Rule {
    fn from(value: f64) -> Self {
        Self::Eq(value.into())
    }
}

impl From<bool> for Rule {
    fn from(value: bool) -> Self {
        Self::Eq(value.into())
    }
}
