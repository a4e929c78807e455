//! Field and relation path resolution against `TableSchema`.
//!
//! # Invariants
//! - Resolved identifiers are the schema's own `&'static str` names, so only
//!   registered columns and relations ever reach rendered SQL.

use crate::criteria::error::{CriteriaError, CriteriaResult};
use crate::model::schema::{Relation, TableSchema};

const PATH_SEPARATOR: char = '.';

/// A column reached through zero or more relations.
#[derive(Debug, Clone)]
pub struct ColumnPath {
    pub relations: Vec<&'static Relation>,
    pub column: &'static str,
}

impl ColumnPath {
    pub fn is_direct(&self) -> bool {
        self.relations.is_empty()
    }

    /// Dotted relation chain without the column, e.g. `profile.categories`.
    pub fn relation_key(&self) -> String {
        relation_key(&self.relations)
    }
}

pub fn relation_key(relations: &[&'static Relation]) -> String {
    relations
        .iter()
        .map(|relation| relation.name)
        .collect::<Vec<_>>()
        .join(".")
}

fn split(path: &str) -> CriteriaResult<Vec<&str>> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(CriteriaError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// Resolves a plain column name on `schema`.
pub fn resolve_column(schema: &'static TableSchema, column: &str) -> CriteriaResult<&'static str> {
    schema
        .columns
        .iter()
        .copied()
        .find(|known| *known == column)
        .ok_or_else(|| CriteriaError::UnknownColumn {
            table: schema.table,
            column: column.to_string(),
        })
}

/// Resolves `a.b.c` as a relation chain only (for `exists` and eager loads).
pub fn resolve_relation_path(
    schema: &'static TableSchema,
    path: &str,
) -> CriteriaResult<Vec<&'static Relation>> {
    let segments = split(path)?;
    walk_relations(schema, &segments, path)
}

/// Resolves `col` or `rel.col` or `rel.nested.col`.
pub fn resolve_column_path(schema: &'static TableSchema, path: &str) -> CriteriaResult<ColumnPath> {
    let segments = split(path)?;
    let (column, relation_segments) = segments
        .split_last()
        .ok_or_else(|| CriteriaError::InvalidPath(path.to_string()))?;
    let relations = walk_relations(schema, relation_segments, path)?;
    let target = relations.last().map_or(schema, |relation| relation.target);
    Ok(ColumnPath {
        relations,
        column: resolve_column(target, column)?,
    })
}

/// Resolves a `relationFilters` entry: relation path plus a plain column.
pub fn resolve_relation_column(
    schema: &'static TableSchema,
    relation_path: &str,
    column: &str,
) -> CriteriaResult<ColumnPath> {
    if column.contains(PATH_SEPARATOR) || column.trim().is_empty() {
        return Err(CriteriaError::InvalidPath(format!("{relation_path}[{column}]")));
    }
    let relations = resolve_relation_path(schema, relation_path)?;
    let target = relations.last().map_or(schema, |relation| relation.target);
    Ok(ColumnPath {
        relations,
        column: resolve_column(target, column)?,
    })
}

fn walk_relations(
    schema: &'static TableSchema,
    segments: &[&str],
    path: &str,
) -> CriteriaResult<Vec<&'static Relation>> {
    let mut current = schema;
    let mut chain = Vec::with_capacity(segments.len());
    for segment in segments {
        let relation = current
            .relation(segment)
            .ok_or_else(|| CriteriaError::UnknownRelation {
                entity: current.entity,
                relation: (*segment).to_string(),
                path: path.to_string(),
            })?;
        chain.push(relation);
        current = relation.target;
    }
    Ok(chain)
}
