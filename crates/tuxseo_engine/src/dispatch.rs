use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, REFERER};
use serde_json::Value;
use tuxseo_logging::{tux_debug, tux_warn};
use url::Url;

use crate::token::PageContext;
use crate::{ActionError, ActionRequest, Method, RequestBody};

const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Performs one request and interprets the response envelope. Never retries.
#[async_trait::async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn perform(&self, request: ActionRequest) -> Result<Value, ActionError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDispatcher {
    base_url: Url,
    client: reqwest::Client,
    page: PageContext,
}

impl ReqwestDispatcher {
    pub fn new(
        base_url: &str,
        page: PageContext,
        settings: DispatchSettings,
    ) -> Result<Self, ActionError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ActionError::Configuration(format!("invalid base url: {err}")))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ActionError::Configuration(err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            page,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ActionError> {
        self.base_url
            .join(endpoint)
            .map_err(|err| ActionError::Configuration(format!("invalid endpoint {endpoint}: {err}")))
    }
}

#[async_trait::async_trait]
impl ActionDispatcher for ReqwestDispatcher {
    async fn perform(&self, request: ActionRequest) -> Result<Value, ActionError> {
        let token = if request.method.is_mutating() {
            Some(self.page.resolve_token().ok_or(ActionError::TokenMissing)?)
        } else {
            None
        };
        let url = self.endpoint_url(&request.endpoint)?;
        tux_debug!("dispatch {} {}", request.method.as_str(), url.path());

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        }
        .header(ACCEPT, "application/json")
        .header(REFERER, self.base_url.as_str());

        if let Some(token) = token {
            builder = builder.header(CSRF_HEADER, token);
        }
        if let Some(cookie) = self.page.cookie_header.as_deref() {
            builder = builder.header(COOKIE, cookie);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            RequestBody::Form(fields) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields)
                    .finish();
                builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded)
            }
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        let result = interpret_response(status, &body);
        if let Err(err) = &result {
            tux_warn!("{} {} failed: {err}", request.method.as_str(), request.endpoint);
        }
        result
    }
}

/// Applies the `{status, message, ...}` envelope rules to a raw response.
///
/// Non-2xx is a network failure carrying the body's `message` (or `detail`) when present.
/// A 2xx body whose `status` is present and not `"success"` is an application failure.
/// Bodies without a status marker are plain payloads.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, ActionError> {
    let parsed: Option<Value> = if body.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str(body).ok()
    };

    if !(200..300).contains(&status) {
        let message = parsed
            .as_ref()
            .and_then(|value| body_message(value, &["message", "detail", "error"]))
            .unwrap_or_else(|| format!("Server error: {status}"));
        return Err(ActionError::Network {
            status: Some(status),
            message,
        });
    }

    let value = parsed.ok_or_else(|| ActionError::Decode("response is not JSON".to_string()))?;
    match value.get("status").and_then(Value::as_str) {
        Some(marker) if marker != "success" => Err(ActionError::Application {
            message: body_message(&value, &["message", "error"]).unwrap_or_default(),
        }),
        _ => Ok(value),
    }
}

fn body_message(value: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

fn map_reqwest_error(err: reqwest::Error) -> ActionError {
    if err.is_timeout() {
        return ActionError::network("Request timed out.");
    }
    if err.is_connect() {
        return ActionError::network("Could not reach the server.");
    }
    ActionError::network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_2xx_prefers_body_message() {
        let err = interpret_response(400, r#"{"message":"Invalid URL"}"#).unwrap_err();
        assert_eq!(
            err,
            ActionError::Network {
                status: Some(400),
                message: "Invalid URL".to_string()
            }
        );
        let err = interpret_response(403, r#"{"detail":"CSRF failed"}"#).unwrap_err();
        assert_eq!(err.user_message(), "CSRF failed");
    }

    #[test]
    fn non_2xx_without_json_uses_status() {
        let err = interpret_response(502, "<html>Bad gateway</html>").unwrap_err();
        assert_eq!(err.user_message(), "Server error: 502");
    }

    #[test]
    fn error_marker_in_2xx_is_application_failure() {
        let err = interpret_response(200, r#"{"status":"error","message":"Invalid URL"}"#).unwrap_err();
        assert_eq!(
            err,
            ActionError::Application {
                message: "Invalid URL".to_string()
            }
        );
    }

    #[test]
    fn bodies_without_marker_are_payloads() {
        assert_eq!(
            interpret_response(200, r#"{"enabled":false}"#).unwrap(),
            json!({"enabled": false})
        );
        assert_eq!(interpret_response(204, "").unwrap(), Value::Null);
        assert!(matches!(
            interpret_response(200, "not json"),
            Err(ActionError::Decode(_))
        ));
    }
}
