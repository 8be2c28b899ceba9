use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::{payload::ActionPayload, routes::INDEX_ACTION};

pub const ERROR_NONE: &str = "ERROR_NONE";

/// Reply of the action broker. Every field is optional on the wire; a field
/// that is present keeps its value even when it is `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActionReply {
    #[serde(
        rename = "errorCode$",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_code: Option<Value>,
    #[serde(
        rename = "message$",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<Value>,
    #[serde(
        rename = "data$",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl ActionReply {
    pub fn success(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(Value::String(code.into())),
            message: Some(Value::String(message.into())),
            data: None,
        }
    }

    pub fn error_code(&self) -> Value {
        self.error_code
            .clone()
            .unwrap_or_else(|| Value::from(ERROR_NONE))
    }

    pub fn message(&self) -> Value {
        self.message.clone().unwrap_or_else(|| Value::from(""))
    }

    /// Only a missing code or the literal `ERROR_NONE` count as success.
    pub fn is_success(&self) -> bool {
        match &self.error_code {
            None => true,
            Some(Value::String(code)) => code == ERROR_NONE,
            Some(_) => false,
        }
    }

    pub fn into_data(self) -> Value {
        self.data.unwrap_or_else(|| Value::Object(Map::new()))
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("action broker request for [{action}] failed")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("action broker rejected [{action}] with status {status}")]
    Status { action: String, status: u16 },
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait ActionBroker: Send + Sync {
    /// Whether the broker finished its own initialization.
    fn is_ready(&self) -> bool {
        true
    }

    async fn act(&self, action: &str, payload: &ActionPayload) -> Result<ActionReply, BrokerError>;
}

/// Runs an action, answering the built-in index action in-process.
pub async fn dispatch(
    broker: &dyn ActionBroker,
    action: &str,
    payload: &ActionPayload,
) -> Result<ActionReply, BrokerError> {
    if action == INDEX_ACTION {
        return Ok(ActionReply::success(json!({ "hello": "world!" })));
    }

    broker.act(action, payload).await
}

#[derive(Debug, Serialize)]
struct ActRequest<'a> {
    pattern: &'a str,
    payload: &'a ActionPayload,
}

/// Forwards actions to a remote broker as `POST {"pattern", "payload"}`.
#[derive(Debug, Clone)]
pub struct HttpBroker {
    client: Client,
    endpoint: Url,
}

impl HttpBroker {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl ActionBroker for HttpBroker {
    async fn act(&self, action: &str, payload: &ActionPayload) -> Result<ActionReply, BrokerError> {
        let transport = |source: reqwest::Error| BrokerError::Transport {
            action: action.to_string(),
            source,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ActRequest {
                pattern: action,
                payload,
            })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrokerError::Status {
                action: action.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<ActionReply>().await.map_err(transport)
    }
}
