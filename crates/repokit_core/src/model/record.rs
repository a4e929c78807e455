//! Hydrated rows and write maps.
//!
//! # Responsibility
//! - Hold one selected row plus any eager-loaded related rows.
//! - Provide typed column access for `Entity::from_record`.
//! - Provide the ordered field map consumed by `create`/`update`.

use crate::model::value::SqlValue;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::FromSql;
use rusqlite::Row;
use serde::Serialize;
use std::collections::BTreeMap;

/// One row read from storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    table: &'static str,
    columns: BTreeMap<String, SqlValue>,
    relations: BTreeMap<String, Vec<Record>>,
}

impl Record {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Reads every selected column of `row`.
    pub(crate) fn from_row(table: &'static str, row: &Row<'_>) -> RepoResult<Self> {
        let mut record = Self::new(table);
        let statement = row.as_ref();
        for index in 0..statement.column_count() {
            let name = statement.column_name(index)?.to_string();
            let value = SqlValue::from(row.get_ref(index)?);
            record.columns.insert(name, value);
        }
        Ok(record)
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(column)
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Reads a mandatory column.
    ///
    /// # Errors
    /// - `InvalidData` when the column was not selected or cannot decode to `T`.
    pub fn get<T: FromSql>(&self, column: &str) -> RepoResult<T> {
        let value = self.columns.get(column).ok_or_else(|| {
            RepoError::InvalidData(format!("column `{}.{column}` was not selected", self.table))
        })?;
        value.decode::<T>().map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid value {value} in `{}.{column}`: {err}",
                self.table
            ))
        })
    }

    /// Reads a column that may be NULL or absent from a projection.
    pub fn get_opt<T: FromSql>(&self, column: &str) -> RepoResult<Option<T>> {
        if !self.has(column) {
            return Ok(None);
        }
        self.get::<Option<T>>(column)
    }

    pub(crate) fn attach(&mut self, relation: &str, related: Vec<Record>) {
        self.relations.insert(relation.to_string(), related);
    }

    /// Eager-loaded rows for `relation`; empty when it was not loaded.
    pub fn related(&self, relation: &str) -> &[Record] {
        self.relations
            .get(relation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First eager-loaded row, for `HasOne`/`BelongsTo` relations.
    pub fn related_one(&self, relation: &str) -> Option<&Record> {
        self.related(relation).first()
    }

    pub fn is_loaded(&self, relation: &str) -> bool {
        self.relations.contains_key(relation)
    }

    pub(crate) fn related_mut(&mut self, relation: &str) -> Option<&mut Vec<Record>> {
        self.relations.get_mut(relation)
    }
}

/// Ordered column → value map used for inserts and updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: BTreeMap<String, SqlValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated column keeps the last value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.entries.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.entries.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.entries.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (column, value) in iter {
            fields.insert(column, value);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::{Fields, Record};
    use crate::model::value::SqlValue;
    use crate::repo::error::RepoError;

    #[test]
    fn get_reports_missing_projection_column() {
        let mut record = Record::new("products");
        record.set("id", 3_i64);

        assert_eq!(record.get::<i64>("id").unwrap(), 3);
        let err = record.get::<String>("name").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("products.name")));
        assert_eq!(record.get_opt::<String>("name").unwrap(), None);
    }

    #[test]
    fn related_defaults_to_empty_when_not_loaded() {
        let mut record = Record::new("users");
        assert!(record.related("orders").is_empty());
        assert!(!record.is_loaded("orders"));

        record.attach("orders", vec![Record::new("orders")]);
        assert!(record.is_loaded("orders"));
        assert_eq!(record.related("orders").len(), 1);
    }

    #[test]
    fn fields_keep_last_value_for_repeated_column() {
        let fields: Fields = [("price", 10_i64), ("price", 20_i64)].into_iter().collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("price"), Some(&SqlValue::Integer(20)));
    }
}
