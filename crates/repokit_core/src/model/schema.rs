//! Static per-entity table registry.
//!
//! # Responsibility
//! - Describe table, key, columns and relations of one entity type.
//! - Resolve column and relation names used by criteria and write maps.
//!
//! # Invariants
//! - Schemas are `'static` and never change at runtime.
//! - Every identifier rendered into SQL must first resolve through a schema.

use crate::model::record::Record;
use crate::repo::error::RepoResult;

/// Primary identifier type shared by all entities.
pub type EntityId = i64;

/// Cardinality of a relation, used when attaching eager-loaded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
}

impl RelationKind {
    pub fn is_single(self) -> bool {
        matches!(self, Self::HasOne | Self::BelongsTo)
    }
}

/// Named link from one table to another.
///
/// Rows are related when `target.foreign_key = parent.local_key`.
#[derive(Debug)]
pub struct Relation {
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: &'static TableSchema,
    pub local_key: &'static str,
    pub foreign_key: &'static str,
}

/// Table layout for one entity type.
#[derive(Debug)]
pub struct TableSchema {
    /// Entity name used in error messages.
    pub entity: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [&'static str],
    pub relations: &'static [Relation],
    /// Archive marker column for soft-delete capable tables.
    pub soft_delete_column: Option<&'static str>,
    /// Whether `created_at`/`updated_at` are filled on writes.
    pub timestamps: bool,
}

impl TableSchema {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|known| *known == column)
    }

    pub fn relation(&self, name: &str) -> Option<&'static Relation> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn is_soft_deletable(&self) -> bool {
        self.soft_delete_column.is_some()
    }
}

/// A mapped record type.
pub trait Entity: Sized {
    fn schema() -> &'static TableSchema;

    /// Builds the entity from a hydrated row.
    ///
    /// Projected reads may hand over partial records; entities decide which
    /// columns are mandatory.
    fn from_record(record: &Record) -> RepoResult<Self>;
}

/// Marker for entities whose schema declares an archive column.
pub trait SoftDeletable: Entity {}
