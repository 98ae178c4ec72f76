//! Field metadata
//!
//! The FieldMap tells the codec how to read and write the leaf clauses for
//! each filterable field. It is supplied by the caller and never mutated.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::filter::FilterRule;

/// Storage kind of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Term,
    Number,
    Date,
    Multi,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Term => write!(f, "term"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Multi => write!(f, "multi"),
        }
    }
}

/// Refinement of a field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSubType {
    /// A term field whose values are 0/1
    Boolean,
}

/// Metadata for one field
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(rename = "subType", default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<FieldSubType>,
    /// Selectable values of a multi field, in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            sub_type: None,
            choices: Vec::new(),
            minimum: None,
            maximum: None,
        }
    }

    pub fn term() -> Self {
        Self::new(FieldKind::Term)
    }

    pub fn boolean() -> Self {
        Self {
            sub_type: Some(FieldSubType::Boolean),
            ..Self::term()
        }
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn multi<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            ..Self::new(FieldKind::Multi)
        }
    }

    /// Set the inclusive bounds offered by a number input
    pub fn with_bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn is_boolean(&self) -> bool {
        self.sub_type == Some(FieldSubType::Boolean)
    }
}

/// What an editor should render for a configured rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Boolean,
    Term,
    Number,
    Date,
    Multi,
}

impl From<FieldKind> for RuleType {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Term => RuleType::Term,
            FieldKind::Number => RuleType::Number,
            FieldKind::Date => RuleType::Date,
            FieldKind::Multi => RuleType::Multi,
        }
    }
}

/// Field name to descriptor, in display order
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FieldMap {
    fields: IndexMap<String, FieldDescriptor>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a FieldMap from its JSON object form
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: FieldDescriptor) {
        self.fields.insert(name.into(), descriptor);
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Editor widget for a rule, None until the rule names a known field
    pub fn rule_type(&self, rule: &FilterRule) -> Option<RuleType> {
        let descriptor = self.get(rule.field.as_deref()?)?;
        if descriptor.is_boolean() {
            return Some(RuleType::Boolean);
        }
        Some(descriptor.kind.into())
    }
}

impl<K: Into<String>> FromIterator<(K, FieldDescriptor)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (K, FieldDescriptor)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
