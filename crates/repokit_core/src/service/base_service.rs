//! Generic entity service.
//!
//! # Responsibility
//! - Provide one entry point per repository operation for callers.
//! - Wrap every mutation in an atomic transaction boundary.
//!
//! # Invariants
//! - Reads pass straight through; they never open a transaction.
//! - A failed mutation leaves storage at its pre-call state.

use crate::config::PaginationDefaults;
use crate::criteria::params::QueryParameters;
use crate::db::transaction::{SqliteTransactions, TransactionRunner};
use crate::model::record::Fields;
use crate::model::schema::{Entity, EntityId};
use crate::repo::base_repo::{Repository, SqliteRepository};
use crate::repo::error::RepoResult;
use crate::repo::page::Page;
use crate::repo::soft_deletes::SoftDeletesRepository;
use rusqlite::Connection;

/// Use-case service over one repository.
pub struct BaseService<R, T> {
    repo: R,
    tx: T,
}

/// Service wired to SQLite repositories and savepoint transactions.
pub type SqliteService<'conn, E> = BaseService<SqliteRepository<'conn, E>, SqliteTransactions<'conn>>;

impl<'conn, E: Entity> BaseService<SqliteRepository<'conn, E>, SqliteTransactions<'conn>> {
    /// Builds repository and transaction runner over the same connection.
    pub fn for_connection(conn: &'conn Connection) -> Self {
        Self::new(SqliteRepository::new(conn), SqliteTransactions::new(conn))
    }

    pub fn with_pagination(self, defaults: PaginationDefaults) -> Self {
        Self {
            repo: self.repo.with_pagination(defaults),
            tx: self.tx,
        }
    }
}

impl<R: Repository, T: TransactionRunner> BaseService<R, T> {
    pub fn new(repo: R, tx: T) -> Self {
        Self { repo, tx }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Runs `work` inside one transaction; composing services use this for
    /// multi-step writes.
    pub fn transaction<U>(&self, work: impl FnOnce(&R) -> RepoResult<U>) -> RepoResult<U> {
        self.tx.run(|| work(&self.repo))
    }

    pub fn all(&self) -> RepoResult<Vec<R::Entity>> {
        self.repo.all()
    }

    pub fn get(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<R::Entity>> {
        self.repo.get(criteria)
    }

    pub fn count(&self, criteria: Option<&QueryParameters>) -> RepoResult<u64> {
        self.repo.count(criteria)
    }

    pub fn paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<R::Entity>> {
        self.repo.paginate(criteria, per_page, page_name, page)
    }

    pub fn paginate_default(
        &self,
        criteria: Option<&QueryParameters>,
        page: Option<u64>,
    ) -> RepoResult<Page<R::Entity>> {
        self.repo.paginate_default(criteria, page)
    }

    pub fn find_by(&self, criteria: Option<&QueryParameters>) -> RepoResult<Option<R::Entity>> {
        self.repo.find_by(criteria)
    }

    pub fn find_by_or_fail(&self, criteria: Option<&QueryParameters>) -> RepoResult<R::Entity> {
        self.repo.find_by_or_fail(criteria)
    }

    pub fn find_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<R::Entity>> {
        self.repo.find_by_id(id, relations, columns)
    }

    pub fn find_by_id_or_fail(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<R::Entity> {
        self.repo.find_by_id_or_fail(id, relations, columns)
    }

    pub fn create(&self, data: &Fields) -> RepoResult<R::Entity> {
        self.transaction(|repo| repo.create(data))
    }

    pub fn update(&self, id: EntityId, data: &Fields) -> RepoResult<R::Entity> {
        self.transaction(|repo| repo.update(id, data))
    }

    pub fn delete(&self, id: EntityId) -> RepoResult<()> {
        self.transaction(|repo| repo.delete(id))
    }
}

impl<R: SoftDeletesRepository, T: TransactionRunner> BaseService<R, T> {
    pub fn with_trashed(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<R::Entity>> {
        self.repo.with_trashed(criteria)
    }

    pub fn with_trashed_paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<R::Entity>> {
        self.repo
            .with_trashed_paginate(criteria, per_page, page_name, page)
    }

    pub fn only_trashed(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<R::Entity>> {
        self.repo.only_trashed(criteria)
    }

    pub fn only_trashed_paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<R::Entity>> {
        self.repo
            .only_trashed_paginate(criteria, per_page, page_name, page)
    }

    pub fn find_with_trashed_by(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Option<R::Entity>> {
        self.repo.find_with_trashed_by(criteria)
    }

    pub fn find_with_trashed_by_or_fail(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<R::Entity> {
        self.repo.find_with_trashed_by_or_fail(criteria)
    }

    pub fn find_with_trashed_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<R::Entity>> {
        self.repo.find_with_trashed_by_id(id, relations, columns)
    }

    pub fn find_with_trashed_by_id_or_fail(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<R::Entity> {
        self.repo
            .find_with_trashed_by_id_or_fail(id, relations, columns)
    }

    pub fn find_only_trashed_by(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Option<R::Entity>> {
        self.repo.find_only_trashed_by(criteria)
    }

    pub fn find_only_trashed_by_or_fail(
        &self,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<R::Entity> {
        self.repo.find_only_trashed_by_or_fail(criteria)
    }

    pub fn find_only_trashed_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<R::Entity>> {
        self.repo.find_only_trashed_by_id(id, relations, columns)
    }

    pub fn find_only_trashed_by_id_or_fail(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<R::Entity> {
        self.repo
            .find_only_trashed_by_id_or_fail(id, relations, columns)
    }

    pub fn restore(&self, id: EntityId) -> RepoResult<bool> {
        self.transaction(|repo| repo.restore(id))
    }

    pub fn force_delete(&self, id: EntityId) -> RepoResult<bool> {
        self.transaction(|repo| repo.force_delete(id))
    }
}
