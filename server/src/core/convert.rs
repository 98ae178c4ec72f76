//! One-shot conversion commands
//!
//! Documents are read whole from a file or stdin and written to stdout. A
//! document is either the bare list, a single clause/node, or the API request
//! body wrapping the list (`{"query": [...]}` / `{"filters": [...]}`).

use std::io::Read;

use anyhow::{Context, Result};
use elastic_builder::{FieldMap, FilterNode, Query, decode, encode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use super::cli::STDIN_PATH;
use crate::utils::file::expand_path;

/// Which way to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Decode,
    Encode,
}

impl Direction {
    /// Request-body key wrapping the input list
    fn wrapper_key(&self) -> &'static str {
        match self {
            Direction::Decode => "query",
            Direction::Encode => "filters",
        }
    }
}

/// Convert one document and print it
pub fn run(direction: Direction, input: &str, pretty: bool, fields: &FieldMap) -> Result<()> {
    let raw = read_input(input)?;
    let output = convert(direction, &raw, fields)?;
    println!("{}", render(&output, pretty)?);
    Ok(())
}

/// Read a document from a path, or stdin for `-`
pub fn read_input(input: &str) -> Result<String> {
    if input == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    let path = expand_path(input);
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn convert(direction: Direction, raw: &str, fields: &FieldMap) -> Result<JsonValue> {
    let document: JsonValue = serde_json::from_str(raw).context("Input is not valid JSON")?;
    tracing::debug!(?direction, "Converting document");
    let output = match direction {
        Direction::Decode => {
            let query: Vec<Query> = unwrap_document(document, direction)?;
            serde_json::to_value(decode(&query, fields)?)?
        }
        Direction::Encode => {
            let filters: Vec<FilterNode> = unwrap_document(document, direction)?;
            serde_json::to_value(encode(&filters, fields)?)?
        }
    };
    Ok(output)
}

fn unwrap_document<T: DeserializeOwned>(
    document: JsonValue,
    direction: Direction,
) -> Result<Vec<T>> {
    let key = direction.wrapper_key();
    let list = match document {
        JsonValue::Array(_) => document,
        JsonValue::Object(mut map)
            if map.len() == 1 && map.get(key).is_some_and(JsonValue::is_array) =>
        {
            map.remove(key).unwrap_or_default()
        }
        single => JsonValue::Array(vec![single]),
    };
    serde_json::from_value(list).with_context(|| format!("Input is not a valid {} document", key))
}

pub fn render(value: &JsonValue, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}
