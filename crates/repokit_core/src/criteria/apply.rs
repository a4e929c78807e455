//! Criteria applier: `QueryParameters` → `SelectQuery`.
//!
//! # Responsibility
//! - Resolve every path, column and relation against the entity schema.
//! - Write constraints into the query in a fixed order: `filters`, then
//!   `relationFilters`, then order, eager loads, limit and projection.
//!
//! # Invariants
//! - Pure: no storage access; all `CriteriaError`s surface here, before any
//!   statement is prepared.
//! - Identical input yields identical SQL text and bind values.
//! - A `relationFilters` rule replaces a dot-notation rule on the same
//!   relation + column pair.

use crate::criteria::error::{CriteriaError, CriteriaResult};
use crate::criteria::params::{Filter, QueryParameters};
use crate::criteria::path::{
    relation_key, resolve_column, resolve_column_path, resolve_relation_column,
    resolve_relation_path, ColumnPath,
};
use crate::criteria::rule::Rule;
use crate::model::schema::{Relation, TableSchema};
use crate::query::select::SelectQuery;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

enum Constraint {
    Column { path: ColumnPath, rule: Rule },
    Has {
        chains: Vec<Vec<&'static Relation>>,
        negate: bool,
    },
}

impl Constraint {
    /// `(relation chain, column)` for relation column rules.
    fn relation_column_key(&self) -> Option<(String, &'static str)> {
        match self {
            Self::Column { path, .. } if !path.is_direct() => {
                Some((path.relation_key(), path.column))
            }
            _ => None,
        }
    }
}

/// Applies `criteria` onto `query`. `None` behaves as empty criteria.
pub fn apply_criteria(
    mut query: SelectQuery,
    criteria: Option<&QueryParameters>,
) -> CriteriaResult<SelectQuery> {
    let Some(criteria) = criteria else {
        return Ok(query);
    };
    let schema = query.schema();

    let mut constraints = Vec::new();
    for filter in criteria.filters() {
        constraints.push(match filter {
            Filter::Where { path, rule } => {
                validate_rule(rule)?;
                Constraint::Column {
                    path: resolve_column_path(schema, path)?,
                    rule: rule.clone(),
                }
            }
            Filter::Exists(relations) => Constraint::Has {
                chains: resolve_relation_set(schema, Filter::EXISTS_KEY, relations)?,
                negate: false,
            },
            Filter::NotExists(relations) => Constraint::Has {
                chains: resolve_relation_set(schema, Filter::NOT_EXISTS_KEY, relations)?,
                negate: true,
            },
        });
    }

    for group in criteria.relation_filters() {
        for (column, rule) in &group.rules {
            validate_rule(rule)?;
            let path = resolve_relation_column(schema, &group.relation, column)?;
            let key = (path.relation_key(), path.column);
            constraints.retain(|existing| existing.relation_column_key().as_ref() != Some(&key));
            constraints.push(Constraint::Column {
                path,
                rule: rule.clone(),
            });
        }
    }

    let mut orders = Vec::with_capacity(criteria.order_by().len());
    for (field, direction) in criteria.order_by() {
        orders.push((resolve_column(schema, field)?, *direction));
    }

    let mut eager = Vec::with_capacity(criteria.relations().len());
    for relation in criteria.relations() {
        eager.push(resolve_relation_path(schema, relation)?);
    }

    let mut columns = Vec::with_capacity(criteria.columns().len());
    for column in criteria.columns() {
        columns.push(resolve_column(schema, column)?);
    }

    for constraint in constraints {
        match constraint {
            Constraint::Column { path, rule } => query.where_rule(&path, &rule),
            Constraint::Has { chains, negate } => {
                for chain in chains {
                    query.where_has(&chain, negate);
                }
            }
        }
    }
    for (column, direction) in orders {
        query.order_by(column, direction);
    }
    for chain in eager {
        query.eager_load(chain);
    }
    if let Some(limit) = criteria.limit() {
        query.limit(limit);
    }
    if !columns.is_empty() {
        query.select(columns);
    }

    Ok(query)
}

fn validate_rule(rule: &Rule) -> CriteriaResult<()> {
    match rule {
        Rule::Date(day) if !DATE_RE.is_match(day) => Err(CriteriaError::InvalidDate(day.clone())),
        _ => Ok(()),
    }
}

fn resolve_relation_set(
    schema: &'static TableSchema,
    operator: &'static str,
    relations: &[String],
) -> CriteriaResult<Vec<Vec<&'static Relation>>> {
    if relations.is_empty() {
        return Err(CriteriaError::InvalidOperand {
            operator,
            expected: "a non-empty list of relation names",
        });
    }
    let chains = relations
        .iter()
        .map(|path| resolve_relation_path(schema, path))
        .collect::<CriteriaResult<Vec<_>>>()?;
    log::debug!(
        "event=criteria_relations module=criteria operator={} relations={}",
        operator,
        chains
            .iter()
            .map(|chain| relation_key(chain))
            .collect::<Vec<_>>()
            .join(",")
    );
    Ok(chains)
}
