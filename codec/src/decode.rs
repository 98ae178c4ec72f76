//! Query to filter tree
//!
//! Unknown shapes degrade to partial rules so an editor stays usable on
//! queries it only half understands. The one hard failure is a negation the
//! filter tree cannot express.

use serde_json::{Map, Value as JsonValue};

use crate::date::{RelativeKind, RelativeWindow, parse_bound};
use crate::error::{CodecError, Result};
use crate::field::{FieldKind, FieldMap};
use crate::filter::{Combinator, FilterGroup, FilterNode, FilterRule, RuleSubType};
use crate::query::{Query, first_key};

/// Decode top-level query clauses into editable filter nodes
pub fn decode(query: &[Query], fields: &FieldMap) -> Result<Vec<FilterNode>> {
    tracing::debug!(clauses = query.len(), "Decoding query");
    query
        .iter()
        .map(|clause| decode_clause(clause, fields, true))
        .collect()
}

/// `truthy` is false only directly under a `not`
fn decode_clause(clause: &Query, fields: &FieldMap, truthy: bool) -> Result<FilterNode> {
    if !truthy && !is_negatable(clause, fields) {
        return Err(CodecError::unsupported_negation(clause.key()));
    }

    let node = match clause {
        Query::And(children) => decode_group(Combinator::And, children, fields)?,
        Query::Or(children) => decode_group(Combinator::Or, children, fields)?,
        Query::Not(inner) => decode_clause(inner, fields, false)?,
        Query::Exists { field } => presence(field, truthy).into(),
        Query::Missing { field } => presence(field, !truthy).into(),
        Query::Term { field, value } | Query::Terms { field, value } => {
            decode_term(field, value, fields, truthy).into()
        }
        Query::Range { field, bounds } => decode_range(field, bounds).into(),
        Query::Unknown { key, body } => {
            tracing::debug!(key = %key, "Unrecognized clause, keeping field only");
            FilterRule {
                field: first_key(body).map(str::to_string),
                ..FilterRule::default()
            }
            .into()
        }
    };
    Ok(node)
}

/// Whether the filter tree has a form for `not <clause>`
fn is_negatable(clause: &Query, fields: &FieldMap) -> bool {
    match clause {
        Query::Exists { .. } | Query::Missing { .. } => true,
        Query::Term { field, .. } | Query::Terms { field, .. } => {
            fields.get(field).map(|d| d.kind) != Some(FieldKind::Multi)
        }
        Query::And(_)
        | Query::Or(_)
        | Query::Not(_)
        | Query::Range { .. }
        | Query::Unknown { .. } => false,
    }
}

fn decode_group(
    combinator: Combinator,
    children: &[Query],
    fields: &FieldMap,
) -> Result<FilterNode> {
    let children = children
        .iter()
        .map(|child| decode_clause(child, fields, true))
        .collect::<Result<Vec<_>>>()?;
    Ok(FilterGroup::with_children(combinator, children).into())
}

fn presence(field: &str, exists: bool) -> FilterRule {
    let sub_type = if exists {
        RuleSubType::Exists
    } else {
        RuleSubType::NotExists
    };
    FilterRule::new(field).with_sub_type(sub_type)
}

fn decode_term(field: &str, value: &JsonValue, fields: &FieldMap, truthy: bool) -> FilterRule {
    let descriptor = fields.get(field);
    let rule = FilterRule::new(field);

    match descriptor.map(|d| d.kind) {
        Some(FieldKind::Multi) => {
            let selected: Vec<&str> = match value {
                JsonValue::String(choice) => vec![choice.as_str()],
                JsonValue::Array(items) => items.iter().filter_map(JsonValue::as_str).collect(),
                _ => Vec::new(),
            };
            let choices = descriptor.map(|d| d.choices.as_slice()).unwrap_or_default();
            rule.with_values(
                choices
                    .iter()
                    .map(|choice| (choice.clone(), selected.contains(&choice.as_str()))),
            )
        }
        Some(FieldKind::Date) if value.is_string() => {
            let sub_type = if truthy {
                RuleSubType::Equals
            } else {
                RuleSubType::NotEquals
            };
            let rule = rule.with_sub_type(sub_type);
            match value.as_str().and_then(parse_bound) {
                Some((date, format)) => rule.with_date(date, format.unwrap_or_default()),
                None => rule.with_value(value.clone()),
            }
        }
        _ => {
            // Numeric terms are 0/1 booleans, unless negated
            let sub_type = match (truthy, value.is_number()) {
                (true, true) => RuleSubType::Boolean,
                (true, false) => RuleSubType::Equals,
                (false, _) => RuleSubType::NotEquals,
            };
            rule.with_sub_type(sub_type).with_value(value.clone())
        }
    }
}

fn decode_range(field: &str, bounds: &Map<String, JsonValue>) -> FilterRule {
    let rule = FilterRule::new(field);
    let Some((comparator, first)) = bounds.iter().next() else {
        return rule;
    };
    let rule = rule.with_sub_type(comparator.as_str());

    let JsonValue::String(first) = first else {
        // Plain numeric range
        return FilterRule {
            value: (!first.is_null()).then(|| first.clone()),
            ..rule
        };
    };

    if bounds.len() > 1
        && let Some(gte) = bounds.get("gte").and_then(JsonValue::as_str)
    {
        let lte = bounds.get("lte").and_then(JsonValue::as_str);
        return match RelativeWindow::detect(gte, lte) {
            Some((kind, days)) => FilterRule {
                sub_type: Some(match kind {
                    RelativeKind::Last => RuleSubType::Last,
                    RelativeKind::Next => RuleSubType::Next,
                }),
                value: days.map(JsonValue::from),
                ..rule
            },
            None => with_bound_date(rule.with_sub_type(RuleSubType::Equals), gte),
        };
    }

    with_bound_date(rule, first)
}

fn with_bound_date(rule: FilterRule, bound: &str) -> FilterRule {
    match parse_bound(bound) {
        Some((date, format)) => rule.with_date(date, format.unwrap_or_default()),
        None => {
            tracing::debug!(bound, "Unreadable date bound");
            rule
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{DateFormat, RuleDate};
    use crate::field::FieldDescriptor;
    use serde_json::json;

    fn fields() -> FieldMap {
        FieldMap::new()
            .with("name", FieldDescriptor::term())
            .with("active", FieldDescriptor::boolean())
            .with("age", FieldDescriptor::number())
            .with("created", FieldDescriptor::date())
            .with("tags", FieldDescriptor::multi(["a", "b", "c"]))
    }

    fn decode_json(query: JsonValue) -> Result<Vec<FilterNode>> {
        let query: Vec<Query> = serde_json::from_value(query).unwrap();
        decode(&query, &fields())
    }

    fn decode_one(clause: JsonValue) -> FilterRule {
        match decode_json(json!([clause])).unwrap().remove(0) {
            FilterNode::Rule(rule) => rule,
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_group_with_children() {
        let nodes = decode_json(json!([
            {"or": [{"exists": {"field": "name"}}, {"and": []}]}
        ]))
        .unwrap();
        assert_eq!(
            nodes,
            vec![
                FilterGroup::with_children(
                    Combinator::Or,
                    vec![
                        FilterRule::new("name").with_sub_type("exists").into(),
                        FilterGroup::new(Combinator::And).into(),
                    ]
                )
                .into()
            ]
        );
    }

    #[test]
    fn test_presence_clauses() {
        assert_eq!(
            decode_one(json!({"missing": {"field": "name"}})),
            FilterRule::new("name").with_sub_type("notExists")
        );
        assert_eq!(
            decode_one(json!({"exists": {"field": "name"}})),
            FilterRule::new("name").with_sub_type("exists")
        );
    }

    #[test]
    fn test_term_string_and_numeric() {
        assert_eq!(
            decode_one(json!({"term": {"name": "ada"}})),
            FilterRule::new("name").with_sub_type("equals").with_value("ada")
        );
        assert_eq!(
            decode_one(json!({"term": {"active": 0}})),
            FilterRule::new("active").with_sub_type("boolean").with_value(0)
        );
    }

    #[test]
    fn test_negated_term() {
        assert_eq!(
            decode_one(json!({"not": {"filter": {"term": {"name": "ada"}}}})),
            FilterRule::new("name").with_sub_type("notEquals").with_value("ada")
        );
        assert_eq!(
            decode_one(json!({"not": {"filter": {"term": {"active": 1}}}})),
            FilterRule::new("active").with_sub_type("notEquals").with_value(1)
        );
    }

    #[test]
    fn test_negated_presence_flips() {
        assert_eq!(
            decode_one(json!({"not": {"filter": {"exists": {"field": "name"}}}})),
            FilterRule::new("name").with_sub_type("notExists")
        );
        assert_eq!(
            decode_one(json!({"not": {"filter": {"missing": {"field": "name"}}}})),
            FilterRule::new("name").with_sub_type("exists")
        );
    }

    #[test]
    fn test_negated_group_is_rejected() {
        let err = decode_json(json!([
            {"not": {"filter": {"and": [{"term": {"name": "ada"}}]}}}
        ]))
        .unwrap_err();
        assert_eq!(err, CodecError::unsupported_negation("and"));
    }

    #[test]
    fn test_other_unsupported_negations() {
        for clause in [
            json!({"not": {"filter": {"range": {"age": {"gt": 1}}}}}),
            json!({"not": {"filter": {"terms": {"tags": ["a"]}}}}),
            json!({"not": {"filter": {"not": {"filter": {"term": {"name": "x"}}}}}}),
            json!({"not": {"filter": {"prefix": {"name": "x"}}}}),
        ] {
            let result = decode_json(json!([clause]));
            assert!(
                matches!(result, Err(CodecError::UnsupportedNegation { .. })),
                "{:?}",
                result
            );
        }
    }

    #[test]
    fn test_multi_values_cover_every_choice() {
        assert_eq!(
            decode_one(json!({"terms": {"tags": ["a", "c"]}})),
            FilterRule::new("tags").with_values([("a", true), ("b", false), ("c", true)])
        );
        assert_eq!(
            decode_one(json!({"term": {"tags": "b"}})),
            FilterRule::new("tags").with_values([("a", false), ("b", true), ("c", false)])
        );
    }

    #[test]
    fn test_numeric_range() {
        assert_eq!(
            decode_one(json!({"range": {"age": {"gte": 18}}})),
            FilterRule::new("age").with_sub_type("gte").with_value(18)
        );
        assert_eq!(
            decode_one(json!({"range": {"age": {"gt": null}}})),
            FilterRule::new("age").with_sub_type("gt")
        );
    }

    #[test]
    fn test_single_sided_date_range() {
        assert_eq!(
            decode_one(json!({"range": {"created": {"lt": "2024-03-05"}}})),
            FilterRule::new("created")
                .with_sub_type("lt")
                .with_date(RuleDate::from_ymd(2024, 3, 5).unwrap(), DateFormat::IsoDate)
        );
    }

    #[test]
    fn test_relative_windows() {
        assert_eq!(
            decode_one(json!({"range": {"created": {"gte": "now-7d", "lte": "now"}}})),
            FilterRule::new("created").with_sub_type("last").with_value(7)
        );
        assert_eq!(
            decode_one(json!({"range": {"created": {"gte": "now", "lte": "now+14d"}}})),
            FilterRule::new("created").with_sub_type("next").with_value(14)
        );
    }

    #[test]
    fn test_absolute_two_sided_range_is_equals() {
        let rule = decode_one(json!({"range": {"created": {
            "gte": "2024-03-05T00:00:00", "lte": "2024-03-05T23:59:59"
        }}}));
        assert_eq!(rule.sub_type, Some(RuleSubType::Equals));
        assert_eq!(rule.date, RuleDate::from_ymd(2024, 3, 5));
        assert_eq!(rule.date_format, DateFormat::IsoDateTime);
    }

    #[test]
    fn test_two_sided_range_without_gte_uses_first_bound() {
        let rule = decode_one(json!({"range": {"created": {
            "gt": "2024-01-01", "lt": "2024-02-01"
        }}}));
        assert_eq!(rule.sub_type, Some(RuleSubType::Gt));
        assert_eq!(rule.date, RuleDate::from_ymd(2024, 1, 1));
    }

    #[test]
    fn test_date_term_reads_a_date() {
        assert_eq!(
            decode_one(json!({"term": {"created": "05-March-2024"}})),
            FilterRule::new("created").with_sub_type("equals").with_date(
                RuleDate::from_ymd(2024, 3, 5).unwrap(),
                DateFormat::DayMonthNameYear
            )
        );
    }

    #[test]
    fn test_unknown_field_decodes_as_term() {
        assert_eq!(
            decode_one(json!({"term": {"owner": "ada"}})),
            FilterRule::new("owner").with_sub_type("equals").with_value("ada")
        );
    }

    #[test]
    fn test_unknown_clause_keeps_field() {
        assert_eq!(
            decode_one(json!({"prefix": {"name": "ad"}})),
            FilterRule::new("name")
        );
        assert_eq!(decode_one(json!("junk")), FilterRule::default());
    }
}
