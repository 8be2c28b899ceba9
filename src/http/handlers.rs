//! Axum handlers bridging routes to the action broker

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, Request},
    http::{Method, Uri},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::broker::dispatch;
use crate::domain::payload::{build_payload, ActionRequest};
use crate::errors::AppError;
use crate::http::request::{
    header_value, parse_query, read_body, Authorization, ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER,
};
use crate::AppState;

pub async fn dispatch_action(
    state: AppState,
    action: Arc<str>,
    request: Request,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    let params: Map<String, Value> = match parts.extract::<RawPathParams>().await {
        Ok(raw) => raw
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect(),
        Err(_) => Map::new(),
    };

    let body = if parts.method == Method::POST || parts.method == Method::PUT {
        read_body(&parts.headers, body)
            .await
            .map_err(|err| AppError::system(&err, state.is_debug))?
    } else {
        Value::Null
    };

    let request = ActionRequest {
        method: parts.method.clone(),
        query: parse_query(parts.uri.query()),
        body,
        params,
        access_token: header_value(&parts.headers, ACCESS_TOKEN_HEADER),
        refresh_token: header_value(&parts.headers, REFRESH_TOKEN_HEADER),
        authorization: parts
            .extensions
            .get::<Authorization>()
            .map(|authorization| authorization.0.clone()),
    };

    let payload = build_payload(request);
    debug!(action = %action, method = %parts.method, "dispatching action");

    let reply = dispatch(state.broker.as_ref(), &action, &payload)
        .await
        .map_err(|err| AppError::system(&err, state.is_debug))?;

    Ok(reply.into_response())
}

pub async fn not_found(uri: Uri) -> AppError {
    let url = uri
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    AppError::not_found(url)
}
