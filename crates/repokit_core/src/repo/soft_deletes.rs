//! Reads and purges across the archived record space.
//!
//! # Responsibility
//! - Expose `with_trashed` (active + archived) and `only_trashed` (archived)
//!   variants of the repository reads.
//! - Restore archived records and remove records physically.
//!
//! # Invariants
//! - Only entities marked `SoftDeletable` get these operations.
//! - A `SoftDeletable` entity whose schema has no archive column fails every
//!   operation with `SoftDeletesUnsupported`.

use crate::criteria::params::QueryParameters;
use crate::model::schema::{Entity, EntityId, SoftDeletable};
use crate::model::value::SqlValue;
use crate::query::select::Scope;
use crate::repo::base_repo::{quote, Repository, SqliteRepository};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::page::Page;

/// Repository operations over active and archived records.
pub trait SoftDeletesRepository: Repository {
    fn with_trashed(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<Self::Entity>>;

    fn with_trashed_paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<Self::Entity>>;

    fn only_trashed(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<Self::Entity>>;

    fn only_trashed_paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<Self::Entity>>;

    fn find_with_trashed_by(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Option<Self::Entity>>;

    fn find_with_trashed_by_or_fail(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Self::Entity> {
        self.find_with_trashed_by(criteria)?
            .ok_or_else(|| RepoError::not_found(Self::Entity::schema().entity, None))
    }

    fn find_with_trashed_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<Self::Entity>>;

    fn find_with_trashed_by_id_or_fail(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Self::Entity> {
        self.find_with_trashed_by_id(id, relations, columns)?
            .ok_or_else(|| RepoError::not_found(Self::Entity::schema().entity, Some(id)))
    }

    fn find_only_trashed_by(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Option<Self::Entity>>;

    fn find_only_trashed_by_or_fail(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Self::Entity> {
        self.find_only_trashed_by(criteria)?
            .ok_or_else(|| RepoError::not_found(Self::Entity::schema().entity, None))
    }

    fn find_only_trashed_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<Self::Entity>>;

    fn find_only_trashed_by_id_or_fail(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Self::Entity> {
        self.find_only_trashed_by_id(id, relations, columns)?
            .ok_or_else(|| RepoError::not_found(Self::Entity::schema().entity, Some(id)))
    }

    /// Un-archives a record.
    ///
    /// # Errors
    /// - `NotFound` when no archived record has this id.
    fn restore(&self, id: EntityId) -> RepoResult<bool>;

    /// Removes a record physically, archived or not.
    ///
    /// # Errors
    /// - `NotFound` when no record has this id.
    fn force_delete(&self, id: EntityId) -> RepoResult<bool>;
}

impl<E: SoftDeletable> SqliteRepository<'_, E> {
    fn archive_column(&self) -> RepoResult<&'static str> {
        let schema = self.schema();
        schema
            .soft_delete_column
            .ok_or(RepoError::SoftDeletesUnsupported(schema.table))
    }

    fn trashed_scope(&self, scope: Scope) -> RepoResult<Scope> {
        self.archive_column().map(|_| scope)
    }
}

impl<E: SoftDeletable> SoftDeletesRepository for SqliteRepository<'_, E> {
    fn with_trashed(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<E>> {
        self.scoped_get(self.trashed_scope(Scope::WithTrashed)?, criteria)
    }

    fn with_trashed_paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<E>> {
        let scope = self.trashed_scope(Scope::WithTrashed)?;
        self.scoped_paginate(scope, criteria, per_page, page_name, page)
    }

    fn only_trashed(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<E>> {
        self.scoped_get(self.trashed_scope(Scope::OnlyTrashed)?, criteria)
    }

    fn only_trashed_paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<E>> {
        let scope = self.trashed_scope(Scope::OnlyTrashed)?;
        self.scoped_paginate(scope, criteria, per_page, page_name, page)
    }

    fn find_with_trashed_by(&self, criteria: Option<&QueryParameters>) -> RepoResult<Option<E>> {
        self.scoped_first(self.trashed_scope(Scope::WithTrashed)?, criteria)
    }

    fn find_with_trashed_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<E>> {
        let scope = self.trashed_scope(Scope::WithTrashed)?;
        self.scoped_find_by_id(scope, id, relations, columns)
    }

    fn find_only_trashed_by(&self, criteria: Option<&QueryParameters>) -> RepoResult<Option<E>> {
        self.scoped_first(self.trashed_scope(Scope::OnlyTrashed)?, criteria)
    }

    fn find_only_trashed_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<E>> {
        let scope = self.trashed_scope(Scope::OnlyTrashed)?;
        self.scoped_find_by_id(scope, id, relations, columns)
    }

    fn restore(&self, id: EntityId) -> RepoResult<bool> {
        let archive = self.archive_column()?;
        let schema = self.schema();

        let mut assignments = vec![format!("{} = NULL", quote(archive))];
        if schema.timestamps && schema.has_column("updated_at") {
            assignments.push(format!("{} = CURRENT_TIMESTAMP", quote("updated_at")));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? AND {} IS NOT NULL;",
            quote(schema.table),
            assignments.join(", "),
            quote(schema.primary_key),
            quote(archive)
        );

        let changed = self.execute_write("restore", id, &sql, &[SqlValue::Integer(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found(schema.entity, Some(id)));
        }
        Ok(changed > 0)
    }

    fn force_delete(&self, id: EntityId) -> RepoResult<bool> {
        self.archive_column()?;
        let schema = self.schema();
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?;",
            quote(schema.table),
            quote(schema.primary_key)
        );

        let changed = self.execute_write("force_delete", id, &sql, &[SqlValue::Integer(id)])?;
        if changed == 0 {
            return Err(RepoError::not_found(schema.entity, Some(id)));
        }
        Ok(changed > 0)
    }
}
