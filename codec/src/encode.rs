//! Filter tree to query
//!
//! Rules the user is still configuring produce no clause. A subtype that is
//! not valid for its field kind is a data bug and fails the whole encode.

use serde_json::{Map, Value as JsonValue};

use crate::date::RelativeWindow;
use crate::error::{CodecError, Result};
use crate::field::{FieldDescriptor, FieldKind, FieldMap};
use crate::filter::{BOOLEAN_CHOICES, Combinator, FilterNode, FilterRule, RuleSubType};
use crate::query::Query;

/// Encode filter nodes into top-level query clauses, skipping incomplete rules
pub fn encode(filters: &[FilterNode], fields: &FieldMap) -> Result<Vec<Query>> {
    tracing::debug!(nodes = filters.len(), "Encoding filters");
    encode_children(filters, fields)
}

fn encode_children(nodes: &[FilterNode], fields: &FieldMap) -> Result<Vec<Query>> {
    let mut clauses = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Some(clause) = encode_node(node, fields)? {
            clauses.push(clause);
        }
    }
    Ok(clauses)
}

fn encode_node(node: &FilterNode, fields: &FieldMap) -> Result<Option<Query>> {
    match node {
        FilterNode::Group(group) => {
            let children = encode_children(&group.children, fields)?;
            Ok(Some(match group.combinator {
                Combinator::And => Query::And(children),
                Combinator::Or => Query::Or(children),
            }))
        }
        FilterNode::Rule(rule) => encode_rule(rule, fields),
    }
}

fn encode_rule(rule: &FilterRule, fields: &FieldMap) -> Result<Option<Query>> {
    let Some(field) = rule.field.as_deref().filter(|f| !f.is_empty()) else {
        tracing::trace!("Skipping rule without field");
        return Ok(None);
    };
    let descriptor = fields
        .get(field)
        .ok_or_else(|| CodecError::UnknownField(field.to_string()))?;

    let clause = match descriptor.kind {
        FieldKind::Term => encode_term(field, rule, descriptor)?,
        FieldKind::Number => encode_number(field, rule),
        FieldKind::Date => encode_date(field, rule)?,
        FieldKind::Multi => Some(encode_multi(field, rule, descriptor)),
    };
    if clause.is_none() {
        tracing::trace!(field, sub_type = ?rule.sub_type, "Skipping incomplete rule");
    }
    Ok(clause)
}

fn encode_term(
    field: &str,
    rule: &FilterRule,
    descriptor: &FieldDescriptor,
) -> Result<Option<Query>> {
    if descriptor.is_boolean() {
        return Ok(encode_boolean(field, rule));
    }
    let Some(sub_type) = rule.chosen_sub_type() else {
        return Ok(None);
    };

    let value = rule.value.as_ref();
    let clause = match sub_type {
        RuleSubType::Equals => value.map(|v| Query::term(field, v.clone())),
        RuleSubType::Boolean => value.and_then(boolean_value).map(|v| Query::term(field, v)),
        RuleSubType::NotEquals => value.map(|v| Query::negate(Query::term(field, v.clone()))),
        RuleSubType::Exists => Some(Query::exists(field)),
        RuleSubType::NotExists => Some(Query::missing(field)),
        RuleSubType::Gt
        | RuleSubType::Gte
        | RuleSubType::Lt
        | RuleSubType::Lte
        | RuleSubType::Last
        | RuleSubType::Next
        | RuleSubType::Other(_) => {
            return Err(CodecError::unexpected_sub_type(
                field,
                FieldKind::Term,
                sub_type.as_str(),
            ));
        }
    };
    Ok(clause)
}

/// Boolean fields ignore the subtype except for a negation
fn encode_boolean(field: &str, rule: &FilterRule) -> Option<Query> {
    let term = Query::term(field, rule.value.as_ref().and_then(boolean_value)?);
    match rule.chosen_sub_type() {
        Some(RuleSubType::NotEquals) => Some(Query::negate(term)),
        _ => Some(term),
    }
}

/// Coerce a boolean rule value to 0/1
fn boolean_value(value: &JsonValue) -> Option<JsonValue> {
    let flag = match value {
        JsonValue::Number(_) => return Some(value.clone()),
        JsonValue::Bool(flag) => *flag,
        JsonValue::String(s) => match BOOLEAN_CHOICES.iter().position(|c| *c == s.as_str()) {
            Some(idx) => idx == 1,
            None => {
                return s
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|n| *n <= 1)
                    .map(JsonValue::from);
            }
        },
        _ => return None,
    };
    Some(JsonValue::from(u8::from(flag)))
}

/// Any subtype is written as the comparator key, an unset value as null
fn encode_number(field: &str, rule: &FilterRule) -> Option<Query> {
    let sub_type = rule.chosen_sub_type()?;
    let mut bounds = Map::new();
    bounds.insert(
        sub_type.as_str().to_string(),
        rule.value.clone().unwrap_or(JsonValue::Null),
    );
    Some(Query::range(field, bounds))
}

fn encode_date(field: &str, rule: &FilterRule) -> Result<Option<Query>> {
    let Some(sub_type) = rule.chosen_sub_type() else {
        return Ok(None);
    };
    let formatted = || rule.date.map(|date| rule.date_format.format(&date));

    let clause = match sub_type {
        RuleSubType::Equals => formatted().map(|d| Query::term(field, d)),
        RuleSubType::NotEquals => formatted().map(|d| Query::negate(Query::term(field, d))),
        RuleSubType::Gt | RuleSubType::Gte | RuleSubType::Lt | RuleSubType::Lte => {
            formatted().map(|d| {
                let mut bounds = Map::new();
                bounds.insert(sub_type.as_str().to_string(), JsonValue::String(d));
                Query::range(field, bounds)
            })
        }
        RuleSubType::Last => day_count(rule)
            .map(|days| Query::range(field, RelativeWindow::Last(days).bounds())),
        RuleSubType::Next => day_count(rule)
            .map(|days| Query::range(field, RelativeWindow::Next(days).bounds())),
        RuleSubType::Exists => Some(Query::exists(field)),
        RuleSubType::NotExists => Some(Query::missing(field)),
        RuleSubType::Boolean | RuleSubType::Other(_) => {
            return Err(CodecError::unexpected_sub_type(
                field,
                FieldKind::Date,
                sub_type.as_str(),
            ));
        }
    };
    Ok(clause)
}

/// Whole, non-negative day count of a relative window
fn day_count(rule: &FilterRule) -> Option<u64> {
    let value = rule.value.as_ref()?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|days| *days >= 0.0 && days.fract() == 0.0)
            .map(|days| days as u64)
    })
}

/// Checked choices in descriptor order; unknown keys are ignored
fn encode_multi(field: &str, rule: &FilterRule, descriptor: &FieldDescriptor) -> Query {
    let checked = |choice: &str| {
        rule.values
            .as_ref()
            .and_then(|values| values.get(choice))
            .copied()
            .unwrap_or(false)
    };
    let selected: Vec<JsonValue> = descriptor
        .choices
        .iter()
        .filter(|choice| checked(choice.as_str()))
        .map(|choice| JsonValue::String(choice.clone()))
        .collect();
    Query::terms(field, selected)
}
