//! JSON criteria input.
//!
//! Accepts the array-shaped filter DSL, e.g.
//!
//! ```json
//! {
//!   "filters": {
//!     "status": "active",
//!     "price": [">", 100],
//!     "profile.city": ["like", "elaz"],
//!     "exists": ["orders"]
//!   },
//!   "relationFilters": { "orders": { "created_at": ["date", "2025-08-01"] } },
//!   "relations": ["profile"],
//!   "orderBy": { "created_at": "desc" },
//!   "limit": 10,
//!   "columns": ["id", "name"]
//! }
//! ```
//!
//! # Invariants
//! - Object key order is preserved (`serde_json/preserve_order`), so mapping
//!   iteration order matches the document.
//! - Operand shape is checked per operator; a wrong shape is a
//!   `CriteriaError`, never a silent coercion.

use crate::criteria::error::{CriteriaError, CriteriaResult};
use crate::criteria::params::{Direction, Filter, QueryParameters, QueryParametersBuilder};
use crate::criteria::rule::{Operator, Rule};
use crate::model::value::SqlValue;
use serde_json::{Map, Value};

impl QueryParameters {
    /// Parses criteria from a JSON document.
    pub fn from_json_str(input: &str) -> CriteriaResult<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|err| CriteriaError::InvalidShape(format!("invalid JSON: {err}")))?;
        Self::from_json(&value)
    }

    /// Parses criteria from an already decoded JSON value.
    pub fn from_json(value: &Value) -> CriteriaResult<Self> {
        let object = expect_object(value, "criteria")?;
        let mut builder = QueryParameters::builder();

        for (key, entry) in object {
            builder = match key.as_str() {
                "filters" => parse_filters(builder, expect_object(entry, "filters")?)?,
                "relationFilters" | "relation_filters" => {
                    parse_relation_filters(builder, expect_object(entry, "relationFilters")?)?
                }
                "relations" => builder.relations(expect_strings(entry, "relations")?),
                "orderBy" | "order_by" => {
                    let mut next = builder;
                    for (field, direction) in expect_object(entry, "orderBy")? {
                        let direction = direction.as_str().ok_or_else(|| {
                            CriteriaError::InvalidDirection(direction.to_string())
                        })?;
                        next = next.order_by(field.clone(), Direction::parse(direction)?);
                    }
                    next
                }
                "limit" => match entry {
                    Value::Null => builder,
                    other => builder.limit(other.as_u64().ok_or_else(|| {
                        CriteriaError::InvalidShape(format!(
                            "`limit` must be a non-negative integer, got {other}"
                        ))
                    })?),
                },
                "columns" => builder.columns(expect_strings(entry, "columns")?),
                other => {
                    return Err(CriteriaError::InvalidShape(format!(
                        "unknown criteria key `{other}`"
                    )))
                }
            };
        }

        Ok(builder.build())
    }
}

fn parse_filters(
    mut builder: QueryParametersBuilder,
    filters: &Map<String, Value>,
) -> CriteriaResult<QueryParametersBuilder> {
    for (key, entry) in filters {
        let filter = match key.as_str() {
            Filter::EXISTS_KEY => Filter::Exists(expect_relation_names(entry, Operator::Exists)?),
            Filter::NOT_EXISTS_KEY => {
                Filter::NotExists(expect_relation_names(entry, Operator::NotExists)?)
            }
            path => Filter::Where {
                path: path.to_string(),
                rule: parse_rule(entry)?,
            },
        };
        builder = builder.push_filter(filter);
    }
    Ok(builder)
}

fn parse_relation_filters(
    mut builder: QueryParametersBuilder,
    groups: &Map<String, Value>,
) -> CriteriaResult<QueryParametersBuilder> {
    for (relation, columns) in groups {
        let columns = expect_object(columns, "relationFilters entry")?;
        for (column, entry) in columns {
            builder = builder.relation_filter(relation.clone(), column.clone(), parse_rule(entry)?);
        }
    }
    Ok(builder)
}

/// Parses one rule: a bare scalar, or `[operator, operand?]`.
pub fn parse_rule(entry: &Value) -> CriteriaResult<Rule> {
    let Value::Array(items) = entry else {
        return scalar(entry, Operator::Eq).map(Rule::Eq);
    };

    let (token, operands) = items
        .split_first()
        .ok_or_else(|| CriteriaError::InvalidShape("empty rule array".to_string()))?;
    let token = token
        .as_str()
        .ok_or_else(|| CriteriaError::UnknownOperator(token.to_string()))?;
    let operator = Operator::parse(token)?;

    match (operator, operands) {
        (Operator::Null, []) => Ok(Rule::Null),
        (Operator::NotNull, []) => Ok(Rule::NotNull),
        (Operator::Null | Operator::NotNull, _) => Err(invalid(operator, "no operand")),
        (Operator::Exists | Operator::NotExists, _) => {
            Err(invalid(operator, "to be used as a filter key"))
        }
        (_, [operand]) => parse_operand(operator, operand),
        _ => Err(invalid(operator, "exactly one operand")),
    }
}

fn parse_operand(operator: Operator, operand: &Value) -> CriteriaResult<Rule> {
    match operator {
        Operator::Eq => scalar(operand, operator).map(Rule::Eq),
        Operator::NotEq => scalar(operand, operator).map(Rule::NotEq),
        Operator::Gt => scalar(operand, operator).map(Rule::Gt),
        Operator::Gte => scalar(operand, operator).map(Rule::Gte),
        Operator::Lt => scalar(operand, operator).map(Rule::Lt),
        Operator::Lte => scalar(operand, operator).map(Rule::Lte),
        Operator::Like => operand
            .as_str()
            .map(|text| Rule::Like(text.to_string()))
            .ok_or_else(|| invalid(operator, "a string")),
        Operator::Date => operand
            .as_str()
            .map(|text| Rule::Date(text.to_string()))
            .ok_or_else(|| invalid(operator, "a YYYY-MM-DD string")),
        Operator::In => match operand {
            Value::Array(values) => values
                .iter()
                .map(|value| scalar(value, operator))
                .collect::<CriteriaResult<Vec<_>>>()
                .map(Rule::In),
            _ => Err(invalid(operator, "a list of values")),
        },
        Operator::Between => match operand {
            Value::Array(values) if values.len() == 2 => Ok(Rule::Between(
                scalar(&values[0], operator)?,
                scalar(&values[1], operator)?,
            )),
            _ => Err(invalid(operator, "a two-element [low, high] range")),
        },
        Operator::Null | Operator::NotNull | Operator::Exists | Operator::NotExists => {
            Err(invalid(operator, "no operand"))
        }
    }
}

fn scalar(value: &Value, operator: Operator) -> CriteriaResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Ok(SqlValue::Integer(integer)),
            None => number
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| invalid(operator, "a representable number")),
        },
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(invalid(operator, "a scalar value")),
    }
}

fn invalid(operator: Operator, expected: &'static str) -> CriteriaError {
    CriteriaError::InvalidOperand {
        operator: operator.token(),
        expected,
    }
}

fn expect_object<'a>(value: &'a Value, what: &str) -> CriteriaResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CriteriaError::InvalidShape(format!("`{what}` must be an object")))
}

fn expect_strings(value: &Value, what: &str) -> CriteriaResult<Vec<String>> {
    let shape_error = || CriteriaError::InvalidShape(format!("`{what}` must be a list of strings"));
    value
        .as_array()
        .ok_or_else(shape_error)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(shape_error))
        .collect()
}

fn expect_relation_names(value: &Value, operator: Operator) -> CriteriaResult<Vec<String>> {
    let names = value
        .as_array()
        .ok_or_else(|| invalid(operator, "a list of relation names"))?;
    names
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(operator, "a list of relation names"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_rule;
    use crate::criteria::error::CriteriaError;
    use crate::criteria::params::{Direction, Filter, QueryParameters};
    use crate::criteria::rule::Rule;
    use crate::model::value::SqlValue;
    use serde_json::json;

    #[test]
    fn parses_full_document_in_order() {
        let criteria = QueryParameters::from_json(&json!({
            "filters": {
                "status": "active",
                "price": [">", 100],
                "name": ["like", "furkan"],
                "score": ["between", [50, 90]],
                "deleted_at": ["null"],
                "exists": ["orders", "roles"]
            },
            "relationFilters": {
                "profile": { "city": ["like", "elaz"] }
            },
            "relations": ["profile", "orders"],
            "orderBy": { "status": "asc", "created_at": "desc" },
            "limit": 5,
            "columns": ["id", "name"]
        }))
        .unwrap();

        let keys: Vec<&str> = criteria.filters().iter().map(Filter::key).collect();
        assert_eq!(keys, ["status", "price", "name", "score", "deleted_at", "exists"]);
        assert_eq!(
            criteria.order_by(),
            [
                ("status".to_string(), Direction::Asc),
                ("created_at".to_string(), Direction::Desc)
            ]
        );
        assert_eq!(criteria.limit(), Some(5));
        assert_eq!(criteria.relation_filters()[0].rules[0].1, Rule::like("elaz"));
    }

    #[test]
    fn bare_values_and_tokens_map_to_rules() {
        assert_eq!(parse_rule(&json!("active")).unwrap(), Rule::eq("active"));
        assert_eq!(parse_rule(&json!(true)).unwrap(), Rule::Eq(SqlValue::Integer(1)));
        assert_eq!(parse_rule(&json!(["!=", 3])).unwrap(), Rule::ne(3));
        assert_eq!(parse_rule(&json!(["in", [1, 2]])).unwrap(), Rule::is_in([1, 2]));
        assert_eq!(parse_rule(&json!([">=", 2.5])).unwrap(), Rule::gte(2.5));
        assert_eq!(parse_rule(&json!(["not_null"])).unwrap(), Rule::NotNull);
    }

    #[test]
    fn unknown_operator_is_malformed() {
        let err = parse_rule(&json!(["~", 3])).unwrap_err();
        assert_eq!(err, CriteriaError::UnknownOperator("~".to_string()));

        let err = parse_rule(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, CriteriaError::UnknownOperator(_)));
    }

    #[test]
    fn wrong_operand_shapes_are_malformed() {
        for entry in [
            json!(["between", [50]]),
            json!(["between", 50]),
            json!(["in", 3]),
            json!(["null", 1]),
            json!(["like"]),
            json!(["=", [1, 2]]),
            json!(["exists", ["orders"]]),
        ] {
            let err = parse_rule(&entry).unwrap_err();
            assert!(
                matches!(err, CriteriaError::InvalidOperand { .. }),
                "unexpected error for {entry}: {err}"
            );
        }
    }

    #[test]
    fn exists_key_requires_relation_names() {
        let err = QueryParameters::from_json(&json!({ "filters": { "exists": "orders" } }))
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidOperand { operator: "exists", .. }));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let err = QueryParameters::from_json_str(r#"{"where": {}}"#).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidShape(_)));
    }
}
