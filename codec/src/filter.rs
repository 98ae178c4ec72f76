//! Editable filter tree
//!
//! The tree the editor mutates: groups of rules, one node per rule or group.
//! Wire shape matches what browser editors persist:
//!
//! ```json
//! [{"type": "group", "subType": "and", "rules": [{"field": "name", "subType": "equals", "value": "x"}]}]
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::date::{DateFormat, RuleDate};

/// Value of the `type` key that marks a group node
const GROUP_TYPE: &str = "group";

/// Boolean rule choices; the index is the encoded value
pub const BOOLEAN_CHOICES: [&str; 2] = ["False", "True"];

/// Boolean combinator of a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    /// Clause key in the query wire format
    pub fn key(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

/// Range comparator keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    pub fn key(&self) -> &'static str {
        match self {
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "gt" => Some(Comparator::Gt),
            "gte" => Some(Comparator::Gte),
            "lt" => Some(Comparator::Lt),
            "lte" => Some(Comparator::Lte),
            _ => None,
        }
    }
}

/// Operator of a rule
///
/// `Other` keeps an unrecognized subtype verbatim so the encoder can
/// report it instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum RuleSubType {
    Equals,
    NotEquals,
    Boolean,
    Exists,
    NotExists,
    Gt,
    Gte,
    Lt,
    Lte,
    Last,
    Next,
    Other(String),
}

impl RuleSubType {
    pub fn as_str(&self) -> &str {
        match self {
            RuleSubType::Equals => "equals",
            RuleSubType::NotEquals => "notEquals",
            RuleSubType::Boolean => "boolean",
            RuleSubType::Exists => "exists",
            RuleSubType::NotExists => "notExists",
            RuleSubType::Gt => "gt",
            RuleSubType::Gte => "gte",
            RuleSubType::Lt => "lt",
            RuleSubType::Lte => "lte",
            RuleSubType::Last => "last",
            RuleSubType::Next => "next",
            RuleSubType::Other(s) => s,
        }
    }

    pub fn comparator(&self) -> Option<Comparator> {
        match self {
            RuleSubType::Gt => Some(Comparator::Gt),
            RuleSubType::Gte => Some(Comparator::Gte),
            RuleSubType::Lt => Some(Comparator::Lt),
            RuleSubType::Lte => Some(Comparator::Lte),
            _ => None,
        }
    }

    /// Whether the editor shows a value or date input for this operator
    pub fn input_needed(&self) -> bool {
        matches!(
            self,
            RuleSubType::Equals
                | RuleSubType::NotEquals
                | RuleSubType::Gt
                | RuleSubType::Gte
                | RuleSubType::Lt
                | RuleSubType::Lte
        )
    }

    /// Whether the editor shows a day-count input for this operator
    pub fn number_needed(&self) -> bool {
        matches!(self, RuleSubType::Last | RuleSubType::Next)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RuleSubType::Other(s) if s.trim().is_empty())
    }
}

impl From<&str> for RuleSubType {
    fn from(s: &str) -> Self {
        match s {
            "equals" => RuleSubType::Equals,
            "notEquals" => RuleSubType::NotEquals,
            "boolean" => RuleSubType::Boolean,
            "exists" => RuleSubType::Exists,
            "notExists" => RuleSubType::NotExists,
            "gt" => RuleSubType::Gt,
            "gte" => RuleSubType::Gte,
            "lt" => RuleSubType::Lt,
            "lte" => RuleSubType::Lte,
            "last" => RuleSubType::Last,
            "next" => RuleSubType::Next,
            other => RuleSubType::Other(other.to_string()),
        }
    }
}

impl From<String> for RuleSubType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<RuleSubType> for String {
    fn from(sub_type: RuleSubType) -> Self {
        match sub_type {
            RuleSubType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl From<Comparator> for RuleSubType {
    fn from(comparator: Comparator) -> Self {
        match comparator {
            Comparator::Gt => RuleSubType::Gt,
            Comparator::Gte => RuleSubType::Gte,
            Comparator::Lt => RuleSubType::Lt,
            Comparator::Lte => RuleSubType::Lte,
        }
    }
}

impl fmt::Display for RuleSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf condition
///
/// Every key is optional: `{}` is a rule the user has not configured yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FilterRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(
        rename = "subType",
        default,
        deserialize_with = "blank_as_unset",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_type: Option<RuleSubType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    /// Checked state per choice of a multi field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<IndexMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<RuleDate>,
    /// Token `date` is rendered with; the first offered token until one is picked
    #[serde(rename = "dateFormat", default, skip_serializing_if = "DateFormat::is_default")]
    pub date_format: DateFormat,
}

/// An empty `subType` is the editor's "nothing picked yet"
fn blank_as_unset<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RuleSubType>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(RuleSubType::from))
}

impl FilterRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<RuleSubType>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_date(mut self, date: RuleDate, format: DateFormat) -> Self {
        self.date = Some(date);
        self.date_format = format;
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Subtype the user actually picked; a blank one counts as unset
    pub fn chosen_sub_type(&self) -> Option<&RuleSubType> {
        self.sub_type.as_ref().filter(|s| !s.is_blank())
    }

    pub fn input_needed(&self) -> bool {
        self.chosen_sub_type().is_some_and(RuleSubType::input_needed)
    }

    pub fn number_needed(&self) -> bool {
        self.chosen_sub_type().is_some_and(RuleSubType::number_needed)
    }
}

/// Boolean aggregation of child nodes; children keep display order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGroup {
    pub combinator: Combinator,
    pub children: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            children: Vec::new(),
        }
    }

    pub fn with_children(combinator: Combinator, children: Vec<FilterNode>) -> Self {
        Self {
            combinator,
            children,
        }
    }

    pub fn add_rule(&mut self) {
        add_rule(&mut self.children);
    }

    pub fn add_group(&mut self) {
        add_group(&mut self.children);
    }

    pub fn remove_child(&mut self, idx: usize) -> Option<FilterNode> {
        remove_child(&mut self.children, idx)
    }
}

/// One node of the filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Group(FilterGroup),
    Rule(FilterRule),
}

impl FilterNode {
    pub fn is_group(&self) -> bool {
        matches!(self, FilterNode::Group(_))
    }
}

impl Default for FilterNode {
    fn default() -> Self {
        FilterNode::Rule(FilterRule::default())
    }
}

impl From<FilterRule> for FilterNode {
    fn from(rule: FilterRule) -> Self {
        FilterNode::Rule(rule)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(group)
    }
}

#[derive(Serialize)]
struct GroupWireRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "subType")]
    combinator: Combinator,
    rules: &'a [FilterNode],
}

#[derive(Deserialize)]
struct GroupWire {
    #[serde(rename = "subType", default)]
    combinator: Combinator,
    #[serde(default)]
    rules: Vec<FilterNode>,
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterNode::Group(group) => GroupWireRef {
                kind: GROUP_TYPE,
                combinator: group.combinator,
                rules: &group.children,
            }
            .serialize(serializer),
            FilterNode::Rule(rule) => rule.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        let is_group = value.get("type").and_then(JsonValue::as_str) == Some(GROUP_TYPE);
        if is_group {
            let wire: GroupWire = serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(FilterNode::Group(FilterGroup::with_children(
                wire.combinator,
                wire.rules,
            )))
        } else {
            serde_json::from_value(value)
                .map(FilterNode::Rule)
                .map_err(D::Error::custom)
        }
    }
}

/// Top-level list of filter nodes owned by an editor
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FilterTree {
    nodes: Vec<FilterNode>,
}

impl FilterTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<FilterNode> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: impl Into<FilterNode>) {
        self.nodes.push(node.into());
    }

    pub fn add_rule(&mut self) {
        add_rule(&mut self.nodes);
    }

    pub fn add_group(&mut self) {
        add_group(&mut self.nodes);
    }

    pub fn remove_child(&mut self, idx: usize) -> Option<FilterNode> {
        remove_child(&mut self.nodes, idx)
    }

    /// Nested group addressed by child indices from the root
    ///
    /// Returns None when the path is empty, out of range, or crosses a rule.
    pub fn group_at_mut(&mut self, path: &[usize]) -> Option<&mut FilterGroup> {
        let (first, rest) = path.split_first()?;
        let mut group = match self.nodes.get_mut(*first)? {
            FilterNode::Group(group) => group,
            FilterNode::Rule(_) => return None,
        };
        for idx in rest {
            group = match group.children.get_mut(*idx)? {
                FilterNode::Group(child) => child,
                FilterNode::Rule(_) => return None,
            };
        }
        Some(group)
    }

    /// Children list at `path`; the empty path is the root list
    pub fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<FilterNode>> {
        if path.is_empty() {
            return Some(&mut self.nodes);
        }
        self.group_at_mut(path).map(|group| &mut group.children)
    }
}

impl From<Vec<FilterNode>> for FilterTree {
    fn from(nodes: Vec<FilterNode>) -> Self {
        Self { nodes }
    }
}

fn add_rule(children: &mut Vec<FilterNode>) {
    children.push(FilterNode::Rule(FilterRule::default()));
}

fn add_group(children: &mut Vec<FilterNode>) {
    children.push(FilterNode::Group(FilterGroup::new(Combinator::And)));
}

fn remove_child(children: &mut Vec<FilterNode>, idx: usize) -> Option<FilterNode> {
    (idx < children.len()).then(|| children.remove(idx))
}
