//! Composable SELECT statement for one entity table.
//!
//! # Responsibility
//! - Accumulate WHERE fragments with positional bind values.
//! - Render parameterized `SELECT` and `SELECT COUNT(*)` statements.
//!
//! # Invariants
//! - Bind values are stored in the same order their `?` placeholders appear.
//! - Relation conditions render as correlated `EXISTS` sub-queries, so a base
//!   row is never duplicated by a join.
//! - Only schema-registered identifiers are rendered, always double-quoted.

use crate::criteria::params::Direction;
use crate::criteria::path::ColumnPath;
use crate::criteria::rule::Rule;
use crate::model::schema::{Relation, TableSchema};
use crate::model::value::SqlValue;

const BASE_ALIAS: &str = "t0";
const SQLITE_MAX_WINDOW: u64 = i64::MAX as u64;

/// Which archive states a read can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Active,
    WithTrashed,
    OnlyTrashed,
}

/// Query object the criteria applier writes into.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    schema: &'static TableSchema,
    scope: Scope,
    wheres: Vec<String>,
    binds: Vec<SqlValue>,
    orders: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    columns: Vec<&'static str>,
    eager: Vec<Vec<&'static Relation>>,
    next_alias: usize,
}

impl SelectQuery {
    pub fn new(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            scope: Scope::Active,
            wheres: Vec::new(),
            binds: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            columns: Vec::new(),
            eager: Vec::new(),
            next_alias: 1,
        }
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Adds `column <op> operand`, directly or through `EXISTS` for relation
    /// paths.
    pub fn where_rule(&mut self, path: &ColumnPath, rule: &Rule) {
        let clause = if path.is_direct() {
            let column = qualified(BASE_ALIAS, path.column);
            self.render_rule(&column, rule)
        } else {
            self.render_exists(BASE_ALIAS, &path.relations, Some((path.column, rule)))
        };
        self.wheres.push(clause);
    }

    /// Asserts that at least one (or, negated, no) related row exists.
    pub fn where_has(&mut self, relations: &[&'static Relation], negate: bool) {
        let clause = self.render_exists(BASE_ALIAS, relations, None);
        if negate {
            self.wheres.push(format!("NOT {clause}"));
        } else {
            self.wheres.push(clause);
        }
    }

    pub fn where_key(&mut self, value: impl Into<SqlValue>) {
        let column = qualified(BASE_ALIAS, self.schema.primary_key);
        self.binds.push(value.into());
        self.wheres.push(format!("{column} = ?"));
    }

    pub fn order_by(&mut self, column: &'static str, direction: Direction) {
        self.orders.push(format!(
            "{} {}",
            qualified(BASE_ALIAS, column),
            direction.as_sql()
        ));
    }

    /// SQLite reads window values as signed 64-bit, so both are capped at `i64::MAX`.
    pub fn limit(&mut self, limit: u64) {
        self.limit = Some(limit.min(SQLITE_MAX_WINDOW));
    }

    pub fn offset(&mut self, offset: u64) {
        self.offset = Some(offset.min(SQLITE_MAX_WINDOW));
    }

    pub fn select(&mut self, columns: Vec<&'static str>) {
        self.columns = columns;
    }

    pub fn eager_load(&mut self, chain: Vec<&'static Relation>) {
        let known = self.eager.iter().any(|loaded| same_chain(loaded, &chain));
        if !chain.is_empty() && !known {
            self.eager.push(chain);
        }
    }

    /// Relation chains to attach after the base rows are read.
    pub fn eager_loads(&self) -> &[Vec<&'static Relation>] {
        &self.eager
    }

    pub fn binds(&self) -> &[SqlValue] {
        &self.binds
    }

    /// Renders the row-returning statement.
    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "SELECT {} FROM {} AS {BASE_ALIAS}",
            self.projection(),
            quote(self.schema.table)
        );
        self.push_where(&mut sql);

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.orders.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) if offset > 0 => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) if offset > 0 => {
                sql.push_str(&format!(" LIMIT -1 OFFSET {offset}"));
            }
            (None, _) => {}
        }

        sql
    }

    /// Renders `SELECT COUNT(*)` over the same conditions, ignoring window and
    /// order.
    pub fn to_count_sql(&self) -> String {
        let mut sql = format!(
            "SELECT COUNT(*) FROM {} AS {BASE_ALIAS}",
            quote(self.schema.table)
        );
        self.push_where(&mut sql);
        sql
    }

    fn push_where(&self, sql: &mut String) {
        let mut clauses: Vec<&str> = Vec::with_capacity(self.wheres.len() + 1);
        let scope_clause = self.scope_clause();
        if let Some(clause) = scope_clause.as_deref() {
            clauses.push(clause);
        }
        clauses.extend(self.wheres.iter().map(String::as_str));

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
    }

    fn scope_clause(&self) -> Option<String> {
        let column = qualified(BASE_ALIAS, self.schema.soft_delete_column?);
        match self.scope {
            Scope::Active => Some(format!("{column} IS NULL")),
            Scope::OnlyTrashed => Some(format!("{column} IS NOT NULL")),
            Scope::WithTrashed => None,
        }
    }

    fn projection(&self) -> String {
        if self.columns.is_empty() {
            return format!("{BASE_ALIAS}.*");
        }

        let mut columns = self.columns.clone();
        // Eager loading needs the parent side of every first-level relation.
        for chain in &self.eager {
            if let Some(first) = chain.first() {
                if !columns.contains(&first.local_key) {
                    columns.push(first.local_key);
                }
            }
        }

        columns
            .iter()
            .map(|column| format!("{} AS {}", qualified(BASE_ALIAS, column), quote(column)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_exists(
        &mut self,
        parent_alias: &str,
        relations: &[&'static Relation],
        terminal: Option<(&'static str, &Rule)>,
    ) -> String {
        let Some((relation, rest)) = relations.split_first() else {
            return "1 = 1".to_string();
        };

        let alias = format!("t{}", self.next_alias);
        self.next_alias += 1;

        let mut conditions = vec![format!(
            "{} = {}",
            qualified(&alias, relation.foreign_key),
            qualified(parent_alias, relation.local_key)
        )];
        if let Some(column) = relation.target.soft_delete_column {
            conditions.push(format!("{} IS NULL", qualified(&alias, column)));
        }

        if !rest.is_empty() {
            let nested = self.render_exists(&alias, rest, terminal);
            conditions.push(nested);
        } else if let Some((column, rule)) = terminal {
            let column = qualified(&alias, column);
            let condition = self.render_rule(&column, rule);
            conditions.push(condition);
        }

        format!(
            "EXISTS (SELECT 1 FROM {} AS {alias} WHERE {})",
            quote(relation.target.table),
            conditions.join(" AND ")
        )
    }

    fn render_rule(&mut self, column: &str, rule: &Rule) -> String {
        match rule {
            Rule::Eq(value) if value.is_null() => format!("{column} IS NULL"),
            Rule::NotEq(value) if value.is_null() => format!("{column} IS NOT NULL"),
            Rule::Eq(value) => self.compare(column, "=", value),
            Rule::NotEq(value) => self.compare(column, "!=", value),
            Rule::Gt(value) => self.compare(column, ">", value),
            Rule::Gte(value) => self.compare(column, ">=", value),
            Rule::Lt(value) => self.compare(column, "<", value),
            Rule::Lte(value) => self.compare(column, "<=", value),
            Rule::Like(operand) => {
                self.binds.push(SqlValue::Text(Rule::like_pattern(operand)));
                format!("{column} LIKE ?")
            }
            Rule::Date(day) => {
                self.binds.push(SqlValue::Text(day.clone()));
                format!("date({column}) = ?")
            }
            Rule::In(values) if values.is_empty() => "0 = 1".to_string(),
            Rule::In(values) => {
                self.binds.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{column} IN ({placeholders})")
            }
            Rule::Between(low, high) => {
                self.binds.push(low.clone());
                self.binds.push(high.clone());
                format!("{column} BETWEEN ? AND ?")
            }
            Rule::Null => format!("{column} IS NULL"),
            Rule::NotNull => format!("{column} IS NOT NULL"),
        }
    }

    fn compare(&mut self, column: &str, operator: &str, value: &SqlValue) -> String {
        self.binds.push(value.clone());
        format!("{column} {operator} ?")
    }
}

fn same_chain(left: &[&'static Relation], right: &[&'static Relation]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| std::ptr::eq(*a, *b))
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn qualified(alias: &str, column: &str) -> String {
    format!("{alias}.{}", quote(column))
}

#[cfg(test)]
mod tests {
    use super::{Scope, SelectQuery};
    use crate::criteria::params::Direction;
    use crate::model::schema::TableSchema;
    use crate::model::value::SqlValue;

    static ITEMS: TableSchema = TableSchema {
        entity: "Item",
        table: "items",
        primary_key: "id",
        columns: &["id", "name", "deleted_at"],
        relations: &[],
        soft_delete_column: Some("deleted_at"),
        timestamps: false,
    };

    #[test]
    fn scope_controls_archive_condition() {
        let active = SelectQuery::new(&ITEMS);
        assert_eq!(
            active.to_sql(),
            "SELECT t0.* FROM \"items\" AS t0 WHERE t0.\"deleted_at\" IS NULL"
        );

        let trashed = SelectQuery::new(&ITEMS).scope(Scope::OnlyTrashed);
        assert!(trashed.to_sql().ends_with("t0.\"deleted_at\" IS NOT NULL"));

        let all = SelectQuery::new(&ITEMS).scope(Scope::WithTrashed);
        assert_eq!(all.to_count_sql(), "SELECT COUNT(*) FROM \"items\" AS t0");
    }

    #[test]
    fn oversized_window_is_capped_to_sqlite_integer_range() {
        let mut query = SelectQuery::new(&ITEMS).scope(Scope::WithTrashed);
        query.limit(u64::MAX);
        query.offset(u64::MAX);

        assert_eq!(
            query.to_sql(),
            format!(
                "SELECT t0.* FROM \"items\" AS t0 LIMIT {max} OFFSET {max}",
                max = i64::MAX
            )
        );
    }

    #[test]
    fn window_and_order_render_after_conditions() {
        let mut query = SelectQuery::new(&ITEMS).scope(Scope::WithTrashed);
        query.where_key(4_i64);
        query.order_by("name", Direction::Desc);
        query.limit(10);
        query.offset(20);
        query.select(vec!["id", "name"]);

        assert_eq!(
            query.to_sql(),
            "SELECT t0.\"id\" AS \"id\", t0.\"name\" AS \"name\" FROM \"items\" AS t0 \
             WHERE t0.\"id\" = ? ORDER BY t0.\"name\" DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(query.binds(), [SqlValue::Integer(4)]);
    }
}
