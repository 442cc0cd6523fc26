use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub type ProjectId = u64;

/// Failure of a single dispatched action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{message}")]
    Network {
        status: Option<u16>,
        message: String,
    },
    #[error("{message}")]
    Application { message: String },
    #[error("{0}")]
    Validation(String),
    #[error("anti-forgery token not found in page context")]
    TokenMissing,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl ActionError {
    pub(crate) fn network(message: impl Into<String>) -> Self {
        ActionError::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Network { .. } | ActionError::Exhausted { .. } => ErrorKind::Network,
            ActionError::Application { .. } | ActionError::Decode(_) => ErrorKind::Application,
            ActionError::Validation(_) => ErrorKind::Validation,
            ActionError::TokenMissing | ActionError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Text suitable for the notification channel; empty when the server gave nothing useful.
    pub fn user_message(&self) -> String {
        match self {
            ActionError::Network { message, .. }
            | ActionError::Application { message }
            | ActionError::Validation(message) => message.clone(),
            ActionError::Exhausted { .. } => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Application,
    Validation,
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Network => "network",
            ErrorKind::Application => "application",
            ErrorKind::Validation => "validation",
            ErrorKind::Configuration => "configuration",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// State-changing methods must carry the anti-forgery token.
    pub fn is_mutating(self) -> bool {
        matches!(self, Method::Post)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// One outgoing request: endpoint path relative to the base URL, method and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub endpoint: String,
    pub method: Method,
    pub body: RequestBody,
}

impl ActionRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Get,
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Post,
            body: RequestBody::Json(body),
        }
    }

    pub fn post_empty(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Post,
            body: RequestBody::Empty,
        }
    }

    pub fn post_form(endpoint: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Post,
            body: RequestBody::Form(fields),
        }
    }
}
