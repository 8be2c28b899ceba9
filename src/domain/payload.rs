//! Translation of an inbound request into the payload handed to the action broker

use axum::http::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::query::{paginate, parse_sort, sanitize_query, Pagination, SortOrder, CONTROL_FIELDS};

pub const ACCESS_TOKEN_FIELD: &str = "_accessToken";
pub const REFRESH_TOKEN_FIELD: &str = "_refreshToken";

/// Everything the payload builder needs from one request.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub method: Method,
    pub query: Map<String, Value>,
    pub body: Value,
    pub params: Map<String, Value>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub authorization: Option<Value>,
}

impl ActionRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            query: Map::new(),
            body: Value::Null,
            params: Map::new(),
            access_token: None,
            refresh_token: None,
            authorization: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub authorization: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

pub fn build_payload(request: ActionRequest) -> ActionPayload {
    let ActionRequest {
        method,
        query,
        body,
        params,
        access_token,
        refresh_token,
        authorization,
    } = request;

    let mut payload = ActionPayload {
        access_token: resolve_token(access_token, &query, ACCESS_TOKEN_FIELD),
        refresh_token: resolve_token(refresh_token, &query, REFRESH_TOKEN_FIELD),
        authorization: authorization.unwrap_or_else(|| Value::Object(Map::new())),
        ..ActionPayload::default()
    };

    match method {
        Method::GET => {
            payload.sort = Some(parse_sort(query.get("_sort")));
            payload.pagination = Some(paginate(query.get("_limit"), query.get("_page")));
            payload.query = Some(sanitize_query(&query, &CONTROL_FIELDS));
            payload.params = Some(params);
        }
        Method::POST => {
            payload.attributes = Some(coerce_attributes(body));
        }
        Method::PUT => {
            payload.params = Some(params);
            payload.attributes = Some(coerce_attributes(body));
        }
        Method::DELETE => {
            payload.params = Some(params);
        }
        _ => {}
    }

    payload
}

/// Header token first, then the query-string fallback, then empty.
fn resolve_token(header: Option<String>, query: &Map<String, Value>, field: &str) -> String {
    header
        .or_else(|| query.get(field).and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

fn coerce_attributes(body: Value) -> Value {
    match body {
        Value::Object(_) | Value::Array(_) => body,
        _ => Value::Object(Map::new()),
    }
}
