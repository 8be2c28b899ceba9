//! Translation of broker replies into HTTP responses
//!
//! Domain failures travel in the body with status 200; only system failures
//! and unmatched routes change the status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::broker::ActionReply;

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ReplyBody {
    Success { error_code: Value, data: Value },
    Failure { error_code: Value, message: Value },
}

impl From<ActionReply> for ReplyBody {
    fn from(reply: ActionReply) -> Self {
        if reply.is_success() {
            return Self::Success {
                error_code: reply.error_code(),
                data: reply.into_data(),
            };
        }

        Self::Failure {
            error_code: reply.error_code(),
            message: reply.message(),
        }
    }
}

impl IntoResponse for ActionReply {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(ReplyBody::from(self))).into_response()
    }
}
