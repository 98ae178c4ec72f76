//! Search-engine query tree
//!
//! Every clause is an object with a single discriminator key. Conversion from
//! JSON is total: anything not understood is kept verbatim as `Unknown` so
//! the decoder can still offer a partial rule.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue, json};

/// One query clause
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    And(Vec<Query>),
    Or(Vec<Query>),
    /// `{"not": {"filter": <clause>}}`
    Not(Box<Query>),
    Term {
        field: String,
        value: JsonValue,
    },
    Terms {
        field: String,
        value: JsonValue,
    },
    /// Comparator to bound, in wire order
    Range {
        field: String,
        bounds: Map<String, JsonValue>,
    },
    Exists {
        field: String,
    },
    Missing {
        field: String,
    },
    /// Clause kept as-is; `key` is empty when the clause was not an object
    Unknown {
        key: String,
        body: JsonValue,
    },
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Query::Terms {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(field: impl Into<String>, bounds: Map<String, JsonValue>) -> Self {
        Query::Range {
            field: field.into(),
            bounds,
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists {
            field: field.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Query::Missing {
            field: field.into(),
        }
    }

    pub fn negate(inner: Query) -> Self {
        Query::Not(Box::new(inner))
    }

    /// Discriminator key of this clause
    pub fn key(&self) -> &str {
        match self {
            Query::And(_) => "and",
            Query::Or(_) => "or",
            Query::Not(_) => "not",
            Query::Term { .. } => "term",
            Query::Terms { .. } => "terms",
            Query::Range { .. } => "range",
            Query::Exists { .. } => "exists",
            Query::Missing { .. } => "missing",
            Query::Unknown { key, .. } => key,
        }
    }

    /// Render the wire form
    pub fn to_value(&self) -> JsonValue {
        match self {
            Query::And(children) => json!({ "and": to_values(children) }),
            Query::Or(children) => json!({ "or": to_values(children) }),
            Query::Not(inner) => json!({ "not": { "filter": inner.to_value() } }),
            Query::Term { field, value } => single("term", field, value.clone()),
            Query::Terms { field, value } => single("terms", field, value.clone()),
            Query::Range { field, bounds } => {
                single("range", field, JsonValue::Object(bounds.clone()))
            }
            Query::Exists { field } => json!({ "exists": { "field": field } }),
            Query::Missing { field } => json!({ "missing": { "field": field } }),
            Query::Unknown { key, body } if key.is_empty() => body.clone(),
            Query::Unknown { key, body } => single_key(key, body.clone()),
        }
    }
}

/// First key of an object body, the field of most leaf clauses
pub(crate) fn first_key(body: &JsonValue) -> Option<&str> {
    body.as_object()?.keys().next().map(String::as_str)
}

fn to_values(children: &[Query]) -> Vec<JsonValue> {
    children.iter().map(Query::to_value).collect()
}

fn single_key(key: &str, value: JsonValue) -> JsonValue {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    JsonValue::Object(map)
}

fn single(key: &str, field: &str, value: JsonValue) -> JsonValue {
    single_key(key, single_key(field, value))
}

fn unknown(key: &str, body: &JsonValue) -> Query {
    Query::Unknown {
        key: key.to_string(),
        body: body.clone(),
    }
}

fn children_of(key: &str, body: &JsonValue) -> Option<Vec<Query>> {
    let items = body.as_array()?;
    tracing::trace!(key, count = items.len(), "Reading group clause");
    Some(items.iter().map(Query::from).collect())
}

fn field_and_value(body: &JsonValue) -> Option<(String, JsonValue)> {
    let (field, value) = body.as_object()?.iter().next()?;
    Some((field.clone(), value.clone()))
}

impl From<&JsonValue> for Query {
    fn from(value: &JsonValue) -> Self {
        let Some((key, body)) = value.as_object().and_then(|map| map.iter().next()) else {
            return unknown("", value);
        };

        let parsed = match key.as_str() {
            "and" => children_of(key, body).map(Query::And),
            "or" => children_of(key, body).map(Query::Or),
            "not" => body
                .get("filter")
                .map(|inner| Query::negate(Query::from(inner))),
            "term" => field_and_value(body).map(|(field, value)| Query::Term { field, value }),
            "terms" => field_and_value(body).map(|(field, value)| Query::Terms { field, value }),
            "range" => field_and_value(body).and_then(|(field, bounds)| match bounds {
                JsonValue::Object(bounds) => Some(Query::Range { field, bounds }),
                _ => None,
            }),
            "exists" | "missing" => body
                .get("field")
                .and_then(JsonValue::as_str)
                .map(|field| {
                    if key == "exists" {
                        Query::exists(field)
                    } else {
                        Query::missing(field)
                    }
                }),
            _ => None,
        };

        parsed.unwrap_or_else(|| unknown(key, body))
    }
}

impl From<JsonValue> for Query {
    fn from(value: JsonValue) -> Self {
        Query::from(&value)
    }
}

impl From<&Query> for JsonValue {
    fn from(query: &Query) -> Self {
        query.to_value()
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Query::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_every_clause_kind() {
        let query: Vec<Query> = serde_json::from_value(json!([
            {"and": [{"term": {"name": "ada"}}]},
            {"or": []},
            {"not": {"filter": {"term": {"name": "bob"}}}},
            {"terms": {"tags": ["a", "c"]}},
            {"range": {"age": {"gte": 18, "lt": 65}}},
            {"exists": {"field": "email"}},
            {"missing": {"field": "phone"}}
        ]))
        .unwrap();

        assert_eq!(
            query[0],
            Query::And(vec![Query::term("name", "ada")])
        );
        assert_eq!(query[1], Query::Or(vec![]));
        assert_eq!(query[2], Query::negate(Query::term("name", "bob")));
        assert_eq!(query[3], Query::terms("tags", json!(["a", "c"])));
        let Query::Range { field, bounds } = &query[4] else {
            panic!("expected range, got {:?}", query[4]);
        };
        assert_eq!(field, "age");
        assert_eq!(bounds.keys().collect::<Vec<_>>(), vec!["gte", "lt"]);
        assert_eq!(query[5], Query::exists("email"));
        assert_eq!(query[6], Query::missing("phone"));
    }

    #[test]
    fn test_keeps_unknown_clauses_verbatim() {
        let raw = json!({"prefix": {"name": "ad"}});
        let query = Query::from(&raw);
        assert_eq!(query.key(), "prefix");
        assert_eq!(query.to_value(), raw);

        let malformed = json!({"and": {"term": {"name": "ada"}}});
        let query = Query::from(&malformed);
        assert!(matches!(query, Query::Unknown { .. }));
        assert_eq!(query.to_value(), malformed);

        let scalar = json!(42);
        assert_eq!(Query::from(&scalar).to_value(), scalar);
    }

    #[test]
    fn test_writes_wire_shapes() {
        let not = Query::negate(Query::term("active", 1));
        assert_eq!(
            serde_json::to_value(&not).unwrap(),
            json!({"not": {"filter": {"term": {"active": 1}}}})
        );
        assert_eq!(
            Query::missing("phone").to_value(),
            json!({"missing": {"field": "phone"}})
        );
    }

    #[test]
    fn test_range_bounds_keep_wire_order() {
        let raw = json!({"range": {"created": {"lte": "now", "gte": "now-7d"}}});
        let Query::Range { bounds, .. } = Query::from(&raw) else {
            panic!("expected range");
        };
        assert_eq!(bounds.keys().collect::<Vec<_>>(), vec!["lte", "gte"]);
    }

    #[test]
    fn test_first_key_of_body() {
        assert_eq!(first_key(&json!({"name": "x"})), Some("name"));
        assert_eq!(first_key(&json!(["name"])), None);
    }
}
