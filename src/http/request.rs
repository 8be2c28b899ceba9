//! Extraction of query strings, bodies and credentials from inbound requests

use axum::{
    body::Body,
    http::{header, HeaderMap},
};
use serde_json::{Map, Value};
use thiserror::Error;

pub const BODY_LIMIT: usize = 100 * 1024;
pub const ACCESS_TOKEN_HEADER: &str = "x-auth-access-token";
pub const REFRESH_TOKEN_HEADER: &str = "x-auth-refresh-token";

/// Authorization context attached by upstream middleware, forwarded untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorization(pub Value);

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read request body")]
    Read(#[source] axum::Error),
    #[error("failed to parse JSON request body")]
    Json(#[source] serde_json::Error),
}

pub const MAX_KEY_DEPTH: usize = 5;

/// Repeated keys collect into an array of strings. Bracketed keys nest:
/// `filter[status]=open` becomes `{"filter": {"status": "open"}}` and
/// `tag[]=a&tag[]=b` becomes `{"tag": ["a", "b"]}`.
pub fn parse_query(query: Option<&str>) -> Map<String, Value> {
    query
        .map(|query| collect_pairs(query.as_bytes()))
        .unwrap_or_default()
}

fn collect_pairs(input: &[u8]) -> Map<String, Value> {
    let mut pairs = Map::new();
    for (key, value) in form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match split_key(&key) {
            Some((root, path)) => insert_at(&mut pairs, root, &path, value),
            None => merge_leaf(&mut pairs, &key, value),
        }
    }
    pairs
}

/// Splits `a[b][]` into `("a", ["b", ""])`. Keys that are not well formed
/// bracket paths, or nest deeper than `MAX_KEY_DEPTH`, stay literal.
fn split_key(key: &str) -> Option<(&str, Vec<&str>)> {
    let open = key.find('[').filter(|open| *open > 0)?;
    let (root, mut rest) = key.split_at(open);

    let mut segments = Vec::new();
    while let Some(inner) = rest.strip_prefix('[') {
        let close = inner.find(']')?;
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }

    (rest.is_empty() && segments.len() <= MAX_KEY_DEPTH).then_some((root, segments))
}

fn insert_at(map: &mut Map<String, Value>, key: &str, path: &[&str], value: Value) {
    let Some((head, tail)) = path.split_first() else {
        merge_leaf(map, key, value);
        return;
    };

    let slot = map.entry(key.to_string()).or_insert(Value::Null);
    insert_into(slot, head, tail, value);
}

// A nested key that disagrees with the shape of an earlier one is dropped.
fn insert_into(slot: &mut Value, head: &str, tail: &[&str], value: Value) {
    if head.is_empty() {
        match *slot {
            Value::Array(_) => {}
            Value::Object(_) => return,
            Value::Null => *slot = Value::Array(Vec::new()),
            _ => {
                let first = slot.take();
                *slot = Value::Array(vec![first]);
            }
        }

        if let Value::Array(items) = slot {
            match tail.split_first() {
                None => items.push(value),
                Some((next, rest)) => {
                    let mut item = Value::Null;
                    insert_into(&mut item, next, rest, value);
                    items.push(item);
                }
            }
        }
        return;
    }

    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        insert_at(map, head, tail, value);
    }
}

fn merge_leaf(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

pub fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Reads JSON and url-encoded bodies. Any other content type yields `null`.
pub async fn read_body(headers: &HeaderMap, body: Body) -> Result<Value, RequestError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let is_json = content_type == "application/json" || content_type.ends_with("+json");
    let is_form = content_type == "application/x-www-form-urlencoded";
    if !is_json && !is_form {
        return Ok(Value::Null);
    }

    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(RequestError::Read)?;

    if is_form {
        return Ok(Value::Object(collect_pairs(&bytes)));
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(RequestError::Json)
}
