use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const ERROR_NOT_FOUND: &str = "ERROR_NOT_FOUND";
pub const ERROR_SYSTEM: &str = "ERROR_SYSTEM";
pub const SYSTEM_ERROR_MESSAGE: &str = "Server encountered an error while trying to handle request";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {url}")]
    NotFound { url: String },
    #[error("system error: {message}")]
    System {
        message: String,
        errors: String,
        debug: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl AppError {
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    /// Wraps a failure raised while serving a request. Diagnostics are only
    /// exposed to the client when `debug` is set.
    pub fn system(err: &(dyn StdError + 'static), debug: bool) -> Self {
        Self::System {
            message: err.to_string(),
            errors: render_chain(err),
            debug,
        }
    }
}

fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str("\n  caused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound { url } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error_code: ERROR_NOT_FOUND,
                    message: format!("The requested URL [{url}] was not found on this server"),
                    errors: None,
                },
            ),
            Self::System {
                message,
                errors,
                debug,
            } => {
                tracing::error!(error = %errors, "request failed with system error");
                let body = if debug {
                    ErrorResponse {
                        error_code: ERROR_SYSTEM,
                        message,
                        errors: Some(errors),
                    }
                } else {
                    ErrorResponse {
                        error_code: ERROR_SYSTEM,
                        message: SYSTEM_ERROR_MESSAGE.to_string(),
                        errors: None,
                    }
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}
