//! Assistant endpoint abstraction and the `POST /chat` HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use proto::{AssistantReply, ChatRequest, EndpointError};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

/// Remote collaborator that turns one user message into one reply.
///
/// Implementations never fail at the type level: every failure mode is
/// folded into an [`AssistantReply`] variant.
#[async_trait]
pub trait AssistantEndpoint: Send + Sync {
    /// Sends `message` and waits for the classified outcome.
    async fn send(&self, message: &str) -> AssistantReply;
}

/// HTTP implementation of [`AssistantEndpoint`] backed by `reqwest`.
pub struct HttpEndpoint {
    client: reqwest::Client,
    chat_url: String,
}

impl HttpEndpoint {
    /// Creates an endpoint posting to `{base_url}/chat` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EndpointError> {
        let chat_url = chat_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EndpointError::Client(e.to_string()))?;
        Ok(Self { client, chat_url })
    }

    /// Returns the resolved `/chat` URL.
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

#[async_trait]
impl AssistantEndpoint for HttpEndpoint {
    async fn send(&self, message: &str) -> AssistantReply {
        debug!(
            url = %self.chat_url,
            chars = message.chars().count(),
            "Sending chat request"
        );

        let resp = match self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest::new(message))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                return AssistantReply::TransportError(e.to_string());
            }
        };

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!("Chat endpoint requires sign-in");
            return AssistantReply::AuthRequired;
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, status = %status, "Reading chat response failed");
                return AssistantReply::TransportError(e.to_string());
            }
        };

        let reply = classify(status.as_u16(), &body);
        debug!(status = %status, success = reply.is_success(), "Chat response classified");
        reply
    }
}

/// Validates `base_url` and appends the `/chat` path.
fn chat_url(base_url: &str) -> Result<String, EndpointError> {
    let invalid = |reason: String| EndpointError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };
    let parsed = reqwest::Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
    }
    Ok(format!("{}/chat", base_url.trim_end_matches('/')))
}

/// Maps a raw `/chat` response onto an [`AssistantReply`].
///
/// An `error` field wins over the status code, so a 500 carrying
/// `{"error": "..."}` surfaces the server's text. Payloads with neither
/// `error` nor a usable `response` are passed through as raw JSON text.
pub fn classify(status: u16, body: &str) -> AssistantReply {
    if status == StatusCode::UNAUTHORIZED.as_u16() {
        return AssistantReply::AuthRequired;
    }

    let payload: Value = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(e) => {
            return AssistantReply::TransportError(format!(
                "invalid response body (HTTP {status}): {e}"
            ));
        }
    };

    // `false` and `0` mean "no error"; an empty string still reaches the generic error text.
    if let Some(error) = payload
        .get("error")
        .filter(|v| is_truthy(v) || v.as_str() == Some(""))
    {
        return AssistantReply::ApplicationError(value_text(error));
    }

    if !(200..300).contains(&status) {
        return AssistantReply::TransportError(format!("HTTP {status}"));
    }

    match payload.get("response") {
        Some(reply) if is_truthy(reply) => AssistantReply::Success(value_text(reply)),
        _ => AssistantReply::Success(payload.to_string()),
    }
}

/// JavaScript-style truthiness, matching how browser clients read the payload.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Renders a JSON value as display text, without quotes for strings.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_appends_path_once() {
        assert_eq!(
            chat_url("http://127.0.0.1:5000").expect("valid url"),
            "http://127.0.0.1:5000/chat"
        );
        assert_eq!(
            chat_url("https://assistant.example.com/").expect("valid url"),
            "https://assistant.example.com/chat"
        );
    }

    #[test]
    fn chat_url_rejects_garbage_and_foreign_schemes() {
        let err = chat_url("not a url").expect_err("must fail");
        assert!(matches!(err, EndpointError::InvalidUrl { .. }));

        let err = chat_url("ftp://example.com").expect_err("must fail");
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn http_endpoint_new_exposes_chat_url() {
        let endpoint =
            HttpEndpoint::new("http://localhost:8080", Duration::from_secs(5)).expect("endpoint");
        assert_eq!(endpoint.chat_url(), "http://localhost:8080/chat");
    }

    #[test]
    fn classify_401_ignores_body() {
        assert_eq!(classify(401, "<html>"), AssistantReply::AuthRequired);
        assert_eq!(
            classify(401, r#"{"error":"Not authenticated"}"#),
            AssistantReply::AuthRequired
        );
    }

    #[test]
    fn classify_reply_field() {
        assert_eq!(
            classify(200, r#"{"response":"Meeting created."}"#),
            AssistantReply::Success("Meeting created.".to_string())
        );
    }

    #[test]
    fn classify_error_field_on_success_and_failure_status() {
        assert_eq!(
            classify(200, r#"{"error":"rate limited"}"#),
            AssistantReply::ApplicationError("rate limited".to_string())
        );
        assert_eq!(
            classify(500, r#"{"error":"Server error: boom"}"#),
            AssistantReply::ApplicationError("Server error: boom".to_string())
        );
    }

    #[test]
    fn classify_non_string_error_is_rendered_as_json() {
        assert_eq!(
            classify(200, r#"{"error":{"code":7}}"#),
            AssistantReply::ApplicationError(r#"{"code":7}"#.to_string())
        );
    }

    #[test]
    fn classify_null_error_falls_through_to_reply() {
        assert_eq!(
            classify(200, r#"{"error":null,"response":"ok"}"#),
            AssistantReply::Success("ok".to_string())
        );
    }

    #[test]
    fn classify_false_or_zero_error_means_no_error() {
        assert_eq!(
            classify(200, r#"{"error":false,"response":"ok"}"#),
            AssistantReply::Success("ok".to_string())
        );
        assert_eq!(
            classify(200, r#"{"error":0,"response":"ok"}"#),
            AssistantReply::Success("ok".to_string())
        );
    }

    #[test]
    fn classify_empty_error_string_is_still_an_error() {
        let reply = classify(200, r#"{"error":"","response":"ignored"}"#);
        assert_eq!(reply, AssistantReply::ApplicationError(String::new()));
        assert_eq!(reply.transcript_text(), "❌ An error occurred");
    }

    #[test]
    fn classify_non_string_reply_is_rendered_as_text() {
        assert_eq!(
            classify(200, r#"{"response":42}"#),
            AssistantReply::Success("42".to_string())
        );
        assert_eq!(
            classify(200, r#"{"response":true}"#),
            AssistantReply::Success("true".to_string())
        );
    }

    #[test]
    fn classify_falsy_reply_passes_raw_json_through() {
        assert_eq!(
            classify(200, r#"{"response":0}"#),
            AssistantReply::Success(r#"{"response":0}"#.to_string())
        );
        assert_eq!(
            classify(200, r#"{"response":null}"#),
            AssistantReply::Success(r#"{"response":null}"#.to_string())
        );
    }

    #[test]
    fn classify_unrecognized_payload_passes_raw_json_through() {
        assert_eq!(
            classify(200, r#"{"status":"queued"}"#),
            AssistantReply::Success(r#"{"status":"queued"}"#.to_string())
        );
        assert_eq!(
            classify(200, r#"{"response":""}"#),
            AssistantReply::Success(r#"{"response":""}"#.to_string())
        );
    }

    #[test]
    fn classify_malformed_body_is_transport_error() {
        match classify(200, "not json") {
            AssistantReply::TransportError(msg) => {
                assert!(msg.contains("invalid response body"));
                assert!(msg.contains("HTTP 200"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn classify_non_2xx_without_error_field_is_transport_error() {
        assert_eq!(
            classify(502, r#"{"detail":"bad gateway"}"#),
            AssistantReply::TransportError("HTTP 502".to_string())
        );
    }
}
