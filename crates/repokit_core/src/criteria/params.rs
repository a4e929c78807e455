//! Read-only query descriptor and its builder.
//!
//! # Invariants
//! - `QueryParameters` exposes no mutating API after `build()`.
//! - Every mapping (filters, relation filters, order) keeps first-insertion
//!   order; re-inserting a key replaces its value in place.

use crate::criteria::error::{CriteriaError, CriteriaResult};
use crate::criteria::rule::Rule;
use std::fmt::{Display, Formatter};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(value: &str) -> CriteriaResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(CriteriaError::InvalidDirection(value.to_string())),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// One entry of the `filters` mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column condition; `path` may be dot-separated through relations.
    Where { path: String, rule: Rule },
    /// At least one related row exists for each relation path.
    Exists(Vec<String>),
    /// No related row exists for each relation path.
    NotExists(Vec<String>),
}

impl Filter {
    pub const EXISTS_KEY: &'static str = "exists";
    pub const NOT_EXISTS_KEY: &'static str = "not_exists";

    /// Mapping key of this entry.
    pub fn key(&self) -> &str {
        match self {
            Self::Where { path, .. } => path.as_str(),
            Self::Exists(_) => Self::EXISTS_KEY,
            Self::NotExists(_) => Self::NOT_EXISTS_KEY,
        }
    }
}

/// Column rules grouped under one relation path.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationFilter {
    pub relation: String,
    pub rules: Vec<(String, Rule)>,
}

/// Criteria for one read query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParameters {
    filters: Vec<Filter>,
    relation_filters: Vec<RelationFilter>,
    relations: Vec<String>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
    columns: Vec<String>,
}

impl QueryParameters {
    pub fn builder() -> QueryParametersBuilder {
        QueryParametersBuilder::default()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn relation_filters(&self) -> &[RelationFilter] {
        &self.relation_filters
    }

    /// Relation paths to eager-load.
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn order_by(&self) -> &[(String, Direction)] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Projected columns; empty means all columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty() || !self.relation_filters.is_empty()
    }
}

/// Builder for [`QueryParameters`].
///
/// ```
/// use repokit_core::{QueryParameters, Rule, Direction};
///
/// let criteria = QueryParameters::builder()
///     .filter("status", "active")
///     .filter("price", Rule::gt(100))
///     .filter("profile.city", Rule::like("elaz"))
///     .exists(["orders"])
///     .order_by("created_at", Direction::Desc)
///     .limit(10)
///     .build();
/// assert_eq!(criteria.filters().len(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParametersBuilder {
    params: QueryParameters,
}

impl QueryParametersBuilder {
    /// Adds a column condition; a bare value means equality.
    pub fn filter(self, path: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.push_filter(Filter::Where {
            path: path.into(),
            rule: rule.into(),
        })
    }

    pub fn exists<I, S>(self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_filter(Filter::Exists(
            relations.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn not_exists<I, S>(self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_filter(Filter::NotExists(
            relations.into_iter().map(Into::into).collect(),
        ))
    }

    /// Inserts or replaces one `filters` entry, keyed by [`Filter::key`].
    pub fn push_filter(mut self, filter: Filter) -> Self {
        let filters = &mut self.params.filters;
        match filters.iter_mut().find(|entry| entry.key() == filter.key()) {
            Some(existing) => *existing = filter,
            None => filters.push(filter),
        }
        self
    }

    /// Adds `column => rule` under `relation` in `relationFilters`.
    pub fn relation_filter(
        mut self,
        relation: impl Into<String>,
        column: impl Into<String>,
        rule: impl Into<Rule>,
    ) -> Self {
        let relation = relation.into();
        let column = column.into();
        let rule = rule.into();
        let groups = &mut self.params.relation_filters;
        let index = match groups.iter().position(|group| group.relation == relation) {
            Some(index) => index,
            None => {
                groups.push(RelationFilter {
                    relation,
                    rules: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let rules = &mut groups[index].rules;
        match rules.iter_mut().find(|(known, _)| *known == column) {
            Some(entry) => entry.1 = rule,
            None => rules.push((column, rule)),
        }
        self
    }

    /// Eager-loads one relation path; duplicates are ignored.
    pub fn with(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        if !self.params.relations.contains(&relation) {
            self.params.relations.push(relation);
        }
        self
    }

    pub fn relations<I, S>(self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        relations
            .into_iter()
            .fold(self, |builder, relation| builder.with(relation))
    }

    /// Adds a sort key; later calls sort with lower precedence.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        let field = field.into();
        let order = &mut self.params.order_by;
        match order.iter_mut().find(|(known, _)| *known == field) {
            Some(entry) => entry.1 = direction,
            None => order.push((field, direction)),
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.params.limit = Some(limit);
        self
    }

    /// Projects the given columns; `*` or an empty list selects all.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut projected: Vec<String> = Vec::new();
        for column in columns.into_iter().map(Into::into) {
            if column == "*" {
                projected.clear();
                break;
            }
            if !projected.contains(&column) {
                projected.push(column);
            }
        }
        self.params.columns = projected;
        self
    }

    pub fn build(self) -> QueryParameters {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Filter, QueryParameters};
    use crate::criteria::rule::Rule;

    #[test]
    fn repeated_filter_key_replaces_in_place() {
        let params = QueryParameters::builder()
            .filter("status", "active")
            .filter("price", Rule::gt(100))
            .filter("status", "inactive")
            .build();

        assert_eq!(params.filters().len(), 2);
        assert_eq!(
            params.filters()[0],
            Filter::Where {
                path: "status".to_string(),
                rule: Rule::eq("inactive"),
            }
        );
    }

    #[test]
    fn exists_entries_use_literal_keys() {
        let params = QueryParameters::builder()
            .exists(["orders", "roles"])
            .not_exists(["bans"])
            .exists(["orders"])
            .build();

        assert_eq!(params.filters().len(), 2);
        assert_eq!(params.filters()[0], Filter::Exists(vec!["orders".to_string()]));
        assert_eq!(params.filters()[1].key(), "not_exists");
    }

    #[test]
    fn relation_filters_group_by_relation() {
        let params = QueryParameters::builder()
            .relation_filter("orders", "total", Rule::gt(500))
            .relation_filter("profile", "city", Rule::like("elaz"))
            .relation_filter("orders", "created_at", Rule::date("2025-08-01"))
            .build();

        let groups = params.relation_filters();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].relation, "orders");
        assert_eq!(groups[0].rules.len(), 2);
    }

    #[test]
    fn star_projection_means_all_columns() {
        let params = QueryParameters::builder().columns(["id", "*"]).build();
        assert!(params.columns().is_empty());

        let params = QueryParameters::builder()
            .columns(["id", "name", "id"])
            .build();
        assert_eq!(params.columns(), ["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn order_keeps_precedence_and_direction_parse_is_strict() {
        let params = QueryParameters::builder()
            .order_by("status", Direction::Asc)
            .order_by("price", Direction::Desc)
            .build();
        assert_eq!(params.order_by()[1], ("price".to_string(), Direction::Desc));
        assert_eq!(Direction::parse("DESC").unwrap(), Direction::Desc);
        assert!(Direction::parse("down").is_err());
    }
}
