//! Generic repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and criteria-driven reads for any `Entity`.
//! - Keep SQL text, bind order and hydration inside the repository boundary.
//!
//! # Invariants
//! - Criteria are fully validated before a statement is prepared.
//! - Default reads see active rows only; archived rows need the
//!   `SoftDeletesRepository` scopes.
//! - Write maps may only name columns registered in the entity schema.

use crate::config::PaginationDefaults;
use crate::criteria::apply::apply_criteria;
use crate::criteria::error::CriteriaError;
use crate::criteria::params::QueryParameters;
use crate::model::record::{Fields, Record};
use crate::model::schema::{Entity, EntityId, TableSchema};
use crate::model::value::SqlValue;
use crate::query::select::{Scope, SelectQuery};
use crate::repo::eager::load_relations;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::page::Page;
use log::{debug, info};
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;
use std::time::Instant;

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";
const NOW_SQL: &str = "CURRENT_TIMESTAMP";

/// Repository interface for one entity type.
pub trait Repository {
    type Entity: Entity;

    /// Every active record.
    fn all(&self) -> RepoResult<Vec<Self::Entity>>;

    /// Records matching `criteria`, honoring its limit and projection.
    fn get(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<Self::Entity>>;

    /// Number of records matching `criteria`; limit and projection are ignored.
    fn count(&self, criteria: Option<&QueryParameters>) -> RepoResult<u64>;

    /// One page of matching records.
    ///
    /// # Contract
    /// - `per_page` must be at least 1.
    /// - `page` of `None` or `0` means the first page.
    /// - The criteria limit is ignored in favor of the page window.
    fn paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<Self::Entity>>;

    fn pagination_defaults(&self) -> PaginationDefaults {
        PaginationDefaults::default()
    }

    /// [`Repository::paginate`] with the configured page size and name.
    fn paginate_default(
        &self,
        criteria: Option<&QueryParameters>,
        page: Option<u64>,
    ) -> RepoResult<Page<Self::Entity>> {
        let defaults = self.pagination_defaults();
        self.paginate(criteria, defaults.per_page, &defaults.page_name, page)
    }

    /// First match in criteria order.
    fn find_by(&self, criteria: Option<&QueryParameters>) -> RepoResult<Option<Self::Entity>>;

    fn find_by_or_fail(&self, criteria: Option<&QueryParameters>) -> RepoResult<Self::Entity> {
        self.find_by(criteria)?
            .ok_or_else(|| RepoError::not_found(Self::Entity::schema().entity, None))
    }

    /// Primary key lookup with eager loads and projection.
    fn find_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<Self::Entity>>;

    fn find_by_id_or_fail(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Self::Entity> {
        self.find_by_id(id, relations, columns)?
            .ok_or_else(|| RepoError::not_found(Self::Entity::schema().entity, Some(id)))
    }

    /// Inserts a record and returns it re-read with its identifier.
    fn create(&self, data: &Fields) -> RepoResult<Self::Entity>;

    /// Applies `data` to an existing record and returns it re-read.
    fn update(&self, id: EntityId, data: &Fields) -> RepoResult<Self::Entity>;

    /// Archives the record when the table has an archive column, deletes it
    /// otherwise.
    fn delete(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed repository for entity `E`.
pub struct SqliteRepository<'conn, E> {
    conn: &'conn Connection,
    defaults: PaginationDefaults,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteRepository<'conn, E> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            defaults: PaginationDefaults::default(),
            _entity: PhantomData,
        }
    }

    pub fn with_pagination(mut self, defaults: PaginationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub(crate) fn schema(&self) -> &'static TableSchema {
        E::schema()
    }

    fn prepare(
        &self,
        scope: Scope,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<SelectQuery> {
        let query = SelectQuery::new(self.schema()).scope(scope);
        Ok(apply_criteria(query, criteria)?)
    }

    fn load(&self, query: &SelectQuery) -> RepoResult<Vec<E>> {
        let mut records = fetch_records(self.conn, query)?;
        load_relations(self.conn, &mut records, query.eager_loads())?;
        records.iter().map(E::from_record).collect()
    }

    pub(crate) fn scoped_get(
        &self,
        scope: Scope,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Vec<E>> {
        let query = self.prepare(scope, criteria)?;
        self.load(&query)
    }

    pub(crate) fn scoped_first(
        &self,
        scope: Scope,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<Option<E>> {
        let mut query = self.prepare(scope, criteria)?;
        query.limit(1);
        Ok(self.load(&query)?.into_iter().next())
    }

    pub(crate) fn scoped_count(
        &self,
        scope: Scope,
        criteria: Option<&QueryParameters>,
    ) -> RepoResult<u64> {
        let query = self.prepare(scope, criteria)?;
        fetch_count(self.conn, &query)
    }

    pub(crate) fn scoped_paginate(
        &self,
        scope: Scope,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<E>> {
        if per_page == 0 {
            return Err(CriteriaError::InvalidPageSize(per_page).into());
        }
        let current_page = page.filter(|page| *page > 0).unwrap_or(1);

        let mut query = self.prepare(scope, criteria)?;
        let total = fetch_count(self.conn, &query)?;
        query.limit(per_page);
        query.offset((current_page - 1).saturating_mul(per_page));
        let items = self.load(&query)?;

        Ok(Page::new(items, total, per_page, current_page, page_name))
    }

    pub(crate) fn scoped_find_by_id(
        &self,
        scope: Scope,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<E>> {
        let criteria = QueryParameters::builder()
            .relations(relations.iter().copied())
            .columns(columns.iter().copied())
            .build();
        let mut query = self.prepare(scope, Some(&criteria))?;
        query.where_key(id);
        query.limit(1);
        Ok(self.load(&query)?.into_iter().next())
    }

    /// Checks a write map against the schema.
    fn check_columns(&self, data: &Fields) -> RepoResult<()> {
        let schema = self.schema();
        match data.iter().find(|(column, _)| !schema.has_column(column)) {
            Some((column, _)) => Err(RepoError::UnknownColumn {
                table: schema.table,
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Timestamp column to fill with `CURRENT_TIMESTAMP`, unless `data`
    /// already sets it.
    fn auto_timestamp(&self, column: &'static str, data: &Fields) -> Option<&'static str> {
        let schema = self.schema();
        (schema.timestamps && schema.has_column(column) && !data.contains(column)).then_some(column)
    }

    fn exists_in(&self, scope: Scope, id: EntityId) -> RepoResult<bool> {
        let mut query = SelectQuery::new(self.schema()).scope(scope);
        query.where_key(id);
        Ok(fetch_count(self.conn, &query)? > 0)
    }

    pub(crate) fn execute_write(
        &self,
        operation: &str,
        id: EntityId,
        sql: &str,
        binds: &[SqlValue],
    ) -> RepoResult<usize> {
        let started_at = Instant::now();
        let changed = self.conn.execute(sql, params_from_iter(binds))?;
        info!(
            "event=repo_write module=repo op={} table={} id={} changed={} duration_ms={}",
            operation,
            self.schema().table,
            id,
            changed,
            started_at.elapsed().as_millis()
        );
        Ok(changed)
    }
}

impl<E: Entity> Repository for SqliteRepository<'_, E> {
    type Entity = E;

    fn all(&self) -> RepoResult<Vec<E>> {
        self.scoped_get(Scope::Active, None)
    }

    fn get(&self, criteria: Option<&QueryParameters>) -> RepoResult<Vec<E>> {
        self.scoped_get(Scope::Active, criteria)
    }

    fn count(&self, criteria: Option<&QueryParameters>) -> RepoResult<u64> {
        self.scoped_count(Scope::Active, criteria)
    }

    fn paginate(
        &self,
        criteria: Option<&QueryParameters>,
        per_page: u64,
        page_name: &str,
        page: Option<u64>,
    ) -> RepoResult<Page<E>> {
        self.scoped_paginate(Scope::Active, criteria, per_page, page_name, page)
    }

    fn pagination_defaults(&self) -> PaginationDefaults {
        self.defaults.clone()
    }

    fn find_by(&self, criteria: Option<&QueryParameters>) -> RepoResult<Option<E>> {
        self.scoped_first(Scope::Active, criteria)
    }

    fn find_by_id(
        &self,
        id: EntityId,
        relations: &[&str],
        columns: &[&str],
    ) -> RepoResult<Option<E>> {
        self.scoped_find_by_id(Scope::Active, id, relations, columns)
    }

    fn create(&self, data: &Fields) -> RepoResult<E> {
        self.check_columns(data)?;
        let schema = self.schema();

        let mut columns = Vec::with_capacity(data.len() + 2);
        let mut values = Vec::with_capacity(data.len() + 2);
        let mut binds = Vec::with_capacity(data.len());
        for (column, value) in data.iter() {
            columns.push(quote(column));
            values.push("?");
            binds.push(value.clone());
        }
        for column in [CREATED_AT, UPDATED_AT] {
            if let Some(column) = self.auto_timestamp(column, data) {
                columns.push(quote(column));
                values.push(NOW_SQL);
            }
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES;", quote(schema.table))
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({});",
                quote(schema.table),
                columns.join(", "),
                values.join(", ")
            )
        };

        let started_at = Instant::now();
        self.conn.execute(&sql, params_from_iter(&binds))?;
        let id = data
            .get(schema.primary_key)
            .and_then(SqlValue::as_i64)
            .unwrap_or_else(|| self.conn.last_insert_rowid());
        info!(
            "event=repo_write module=repo op=create table={} id={} duration_ms={}",
            schema.table,
            id,
            started_at.elapsed().as_millis()
        );

        self.scoped_find_by_id(Scope::WithTrashed, id, &[], &[])?
            .ok_or_else(|| RepoError::not_found(schema.entity, Some(id)))
    }

    fn update(&self, id: EntityId, data: &Fields) -> RepoResult<E> {
        self.check_columns(data)?;
        let schema = self.schema();
        if !self.exists_in(Scope::Active, id)? {
            return Err(RepoError::not_found(schema.entity, Some(id)));
        }

        let mut assignments = Vec::with_capacity(data.len() + 1);
        let mut binds = Vec::with_capacity(data.len() + 1);
        for (column, value) in data.iter() {
            assignments.push(format!("{} = ?", quote(column)));
            binds.push(value.clone());
        }
        if let Some(column) = self.auto_timestamp(UPDATED_AT, data) {
            assignments.push(format!("{} = {NOW_SQL}", quote(column)));
        }

        if !assignments.is_empty() {
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ?;",
                quote(schema.table),
                assignments.join(", "),
                quote(schema.primary_key)
            );
            binds.push(SqlValue::Integer(id));
            self.execute_write("update", id, &sql, &binds)?;
        }

        let id = data
            .get(schema.primary_key)
            .and_then(SqlValue::as_i64)
            .unwrap_or(id);
        self.scoped_find_by_id(Scope::WithTrashed, id, &[], &[])?
            .ok_or_else(|| RepoError::not_found(schema.entity, Some(id)))
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let schema = self.schema();
        if !self.exists_in(Scope::Active, id)? {
            return Err(RepoError::not_found(schema.entity, Some(id)));
        }

        let sql = match schema.soft_delete_column {
            Some(archive) => {
                let mut assignments = vec![format!("{} = {NOW_SQL}", quote(archive))];
                if let Some(column) = self.auto_timestamp(UPDATED_AT, &Fields::new()) {
                    assignments.push(format!("{} = {NOW_SQL}", quote(column)));
                }
                format!(
                    "UPDATE {} SET {} WHERE {} = ? AND {} IS NULL;",
                    quote(schema.table),
                    assignments.join(", "),
                    quote(schema.primary_key),
                    quote(archive)
                )
            }
            None => format!(
                "DELETE FROM {} WHERE {} = ?;",
                quote(schema.table),
                quote(schema.primary_key)
            ),
        };
        self.execute_write("delete", id, &sql, &[SqlValue::Integer(id)])?;
        Ok(())
    }
}

/// Runs `query` and returns its rows in statement order.
pub(crate) fn fetch_records(conn: &Connection, query: &SelectQuery) -> RepoResult<Vec<Record>> {
    let started_at = Instant::now();
    let table = query.schema().table;
    let mut stmt = conn.prepare(&query.to_sql())?;
    let mut rows = stmt.query(params_from_iter(query.binds()))?;

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(Record::from_row(table, row)?);
    }

    debug!(
        "event=repo_query module=repo kind=select table={} rows={} duration_ms={}",
        table,
        records.len(),
        started_at.elapsed().as_millis()
    );
    Ok(records)
}

pub(crate) fn fetch_count(conn: &Connection, query: &SelectQuery) -> RepoResult<u64> {
    let started_at = Instant::now();
    let total: i64 = conn.query_row(
        &query.to_count_sql(),
        params_from_iter(query.binds()),
        |row| row.get(0),
    )?;
    debug!(
        "event=repo_query module=repo kind=count table={} total={} duration_ms={}",
        query.schema().table,
        total,
        started_at.elapsed().as_millis()
    );
    u64::try_from(total).map_err(|_| RepoError::InvalidData(format!("negative row count {total}")))
}

pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}
