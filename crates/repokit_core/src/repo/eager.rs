//! Batch eager loading of relation chains.
//!
//! # Responsibility
//! - Attach related rows to already-read parent records.
//!
//! # Invariants
//! - One query per relation level and key chunk, never one per parent row.
//! - Archived related rows are not attached.
//! - Attached rows are ordered by the related table's primary key.

use crate::criteria::params::Direction;
use crate::criteria::path::ColumnPath;
use crate::criteria::rule::Rule;
use crate::model::record::Record;
use crate::model::schema::Relation;
use crate::model::value::SqlValue;
use crate::query::select::SelectQuery;
use crate::repo::base_repo::fetch_records;
use crate::repo::error::RepoResult;
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};

/// Upper bound of bind values per `IN (...)` lookup.
const KEY_CHUNK: usize = 500;

/// Hashable form of a join column value; NULL never joins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum JoinKey {
    Integer(i64),
    Real(u64),
    Text(String),
    Blob(Vec<u8>),
}

impl JoinKey {
    fn of(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Null => None,
            SqlValue::Integer(value) => Some(Self::Integer(*value)),
            SqlValue::Real(value) => Some(Self::Real(value.to_bits())),
            SqlValue::Text(value) => Some(Self::Text(value.clone())),
            SqlValue::Blob(value) => Some(Self::Blob(value.clone())),
        }
    }
}

/// Attaches every chain in `chains` to `records`.
pub(crate) fn load_relations(
    conn: &Connection,
    records: &mut [Record],
    chains: &[Vec<&'static Relation>],
) -> RepoResult<()> {
    if records.is_empty() {
        return Ok(());
    }
    for chain in chains {
        load_chain(conn, records, chain)?;
    }
    Ok(())
}

fn load_chain(
    conn: &Connection,
    records: &mut [Record],
    chain: &[&'static Relation],
) -> RepoResult<()> {
    let Some((relation, rest)) = chain.split_first() else {
        return Ok(());
    };

    let loaded = records.iter().all(|record| record.is_loaded(relation.name));
    if !loaded {
        attach_level(conn, records, relation)?;
    }

    if rest.is_empty() {
        return Ok(());
    }

    // Flatten every parent's children so the next level is one batch.
    let mut counts = Vec::with_capacity(records.len());
    let mut children = Vec::new();
    for record in records.iter_mut() {
        let taken = record
            .related_mut(relation.name)
            .map(std::mem::take)
            .unwrap_or_default();
        counts.push(taken.len());
        children.extend(taken);
    }

    let nested = load_chain(conn, &mut children, rest);

    let mut remaining = children.into_iter();
    for (record, count) in records.iter_mut().zip(counts) {
        let restored: Vec<Record> = remaining.by_ref().take(count).collect();
        if let Some(slot) = record.related_mut(relation.name) {
            *slot = restored;
        }
    }
    nested
}

fn attach_level(
    conn: &Connection,
    records: &mut [Record],
    relation: &'static Relation,
) -> RepoResult<()> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for record in records.iter() {
        if let Some(value) = record.value(relation.local_key) {
            if let Some(key) = JoinKey::of(value) {
                if seen.insert(key) {
                    keys.push(value.clone());
                }
            }
        }
    }

    let mut grouped: HashMap<JoinKey, Vec<Record>> = HashMap::new();
    for chunk in keys.chunks(KEY_CHUNK) {
        for related in fetch_related(conn, relation, chunk)? {
            let key = related.value(relation.foreign_key).and_then(JoinKey::of);
            if let Some(key) = key {
                grouped.entry(key).or_default().push(related);
            }
        }
    }

    for record in records.iter_mut() {
        let mut related = record
            .value(relation.local_key)
            .and_then(JoinKey::of)
            .and_then(|key| grouped.get(&key).cloned())
            .unwrap_or_default();
        if relation.kind.is_single() {
            related.truncate(1);
        }
        record.attach(relation.name, related);
    }

    log::debug!(
        "event=eager_load module=repo relation={} table={} parents={} keys={}",
        relation.name,
        relation.target.table,
        records.len(),
        keys.len()
    );
    Ok(())
}

fn fetch_related(
    conn: &Connection,
    relation: &'static Relation,
    keys: &[SqlValue],
) -> RepoResult<Vec<Record>> {
    let target = relation.target;
    let mut query = SelectQuery::new(target);
    let path = ColumnPath {
        relations: Vec::new(),
        column: relation.foreign_key,
    };
    query.where_rule(&path, &Rule::In(keys.to_vec()));
    query.order_by(target.primary_key, Direction::Asc);
    fetch_records(conn, &query)
}
