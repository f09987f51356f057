//! Response classification.
//!
//! Turns a [`RawResponse`] into a parsed JSON payload or a [`GatewayError`],
//! dispatching on the `Content-Type` header:
//!
//! - JSON: success for statuses in `200..399`, otherwise the server's
//!   `message` field (or a synthesized message with status and body)
//! - HTML: always an error; proxies and misconfigured base URLs answer with
//!   HTML pages, so the page text is reduced to a short diagnostic
//! - empty body: success only for 200/204
//! - anything else: error embedding status and body
//!
//! The raw exchange is kept alongside the outcome as a [`DebugContext`].

use scraper::Html;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};
use crate::transport::RawResponse;

/// Maximum number of characters of HTML page text embedded in an error.
pub const HTML_DETAIL_LIMIT: usize = 500;

/// Hint prepended to every HTML error.
pub const BASE_URL_HINT: &str = "Please check the asset configuration parameters (the base_url should not end with /api/v1 e.g. https://admin.zscaler_instance.net).";

/// Raw status, body and headers of one exchange, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugContext {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl DebugContext {
    /// Copies the diagnostic parts of a response.
    pub fn capture(raw: &RawResponse) -> Self {
        let headers = raw
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            status: raw.status,
            body: raw.body.clone(),
            headers,
        }
    }
}

/// A classified response.
#[derive(Debug)]
pub struct Classified {
    /// Raw exchange, present whether or not the call succeeded.
    pub debug: DebugContext,
    /// Parsed payload or the classified failure.
    pub outcome: Result<Value>,
}

/// Classifies a response by content type and status.
pub fn classify(raw: &RawResponse) -> Classified {
    let content_type = raw.content_type().to_ascii_lowercase();

    let outcome = if content_type.contains("json") {
        classify_json(raw)
    } else if content_type.contains("html") {
        Err(classify_html(raw))
    } else if raw.body.is_empty() {
        classify_empty(raw)
    } else {
        Err(GatewayError::MalformedResponse {
            status: raw.status,
            message: format!(
                "Can't process response from server. Status Code: {} Data from server: {}",
                raw.status,
                escape_braces(&raw.body)
            ),
            debug: None,
        })
    };

    let debug = DebugContext::capture(raw);
    let outcome = outcome.map_err(|e| e.with_debug(debug.clone()));
    Classified { debug, outcome }
}

/// Returns true for statuses the gateway uses to report success.
pub fn is_success_status(status: u16) -> bool {
    (200..399).contains(&status)
}

fn classify_json(raw: &RawResponse) -> Result<Value> {
    let parsed: Value =
        serde_json::from_str(&raw.body).map_err(|e| GatewayError::MalformedResponse {
            status: raw.status,
            message: format!("Unable to parse JSON response. Error: {}", e),
            debug: None,
        })?;

    if is_success_status(raw.status) {
        return Ok(parsed);
    }

    let message = match parsed.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => format!(
            "Error from server. Status Code: {} Data from server: {}",
            raw.status,
            escape_braces(&raw.body)
        ),
    };

    Err(GatewayError::Http {
        status: raw.status,
        message,
        debug: None,
    })
}

fn classify_html(raw: &RawResponse) -> GatewayError {
    let text = html_text(&raw.body);
    let detail: String = text.chars().take(HTML_DETAIL_LIMIT).collect();

    let message = format!(
        "{}Status Code: {}. Data from server:\n{}\n",
        BASE_URL_HINT, raw.status, detail
    );

    GatewayError::MalformedResponse {
        status: raw.status,
        message: escape_braces(&message),
        debug: None,
    }
}

fn classify_empty(raw: &RawResponse) -> Result<Value> {
    match raw.status {
        200 | 204 => Ok(Value::Object(Map::new())),
        status => Err(GatewayError::EmptyResponse {
            status,
            debug: None,
        }),
    }
}

/// Visible text of an HTML document, one trimmed non-blank line per line.
pub fn html_text(body: &str) -> String {
    let document = Html::parse_document(body);
    let text: String = document.root_element().text().collect();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Doubles braces so server text survives downstream format-string handling.
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn html(status: u16, body: &str) -> RawResponse {
        RawResponse::new(status, body).with_header("content-type", "text/html; charset=utf-8")
    }

    // ==================== JSON Tests ====================

    #[test]
    fn json_success_returns_payload() {
        let raw = RawResponse::json(200, &json!({"blacklistUrls": ["a.com"]}));
        let classified = classify(&raw);
        assert_eq!(
            classified.outcome.unwrap(),
            json!({"blacklistUrls": ["a.com"]})
        );
    }

    #[test]
    fn json_redirect_range_is_success() {
        let raw = RawResponse::json(302, &json!([]));
        assert!(classify(&raw).outcome.is_ok());
    }

    #[test]
    fn json_error_uses_message_field() {
        let raw = RawResponse::json(400, &json!({"code": "INVALID", "message": "Bad input"}));
        let err = classify(&raw).outcome.unwrap_err();
        assert!(matches!(err, GatewayError::Http { status: 400, .. }));
        assert_eq!(err.to_string(), "Bad input");
    }

    #[test]
    fn json_error_without_message_embeds_escaped_body() {
        let raw = RawResponse::json(500, &json!({"code": "BOOM"}));
        let err = classify(&raw).outcome.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error from server. Status Code: 500 Data from server: {{\"code\":\"BOOM\"}}"
        );
    }

    #[test]
    fn json_unparsable_body_is_malformed() {
        let raw = RawResponse::new(200, "{not json").with_header("content-type", "application/json");
        let err = classify(&raw).outcome.unwrap_err();
        assert!(err.to_string().starts_with("Unable to parse JSON response."));
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn json_content_type_with_empty_204_keeps_status() {
        let raw = RawResponse::new(204, "").with_header("content-type", "application/json");
        let err = classify(&raw).outcome.unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    // ==================== HTML Tests ====================

    #[test]
    fn html_is_error_even_on_200() {
        let raw = html(200, "<html><body><h1>Login</h1></body></html>");
        let err = classify(&raw).outcome.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(BASE_URL_HINT));
        assert!(message.contains("Status Code: 200. Data from server:\nLogin\n"));
    }

    #[test]
    fn html_collapses_blank_lines() {
        let text = html_text("<html><body>\n  <p>First</p>\n\n   \n<p>Second</p></body></html>");
        assert_eq!(text, "First\nSecond");
    }

    #[test]
    fn html_detail_is_truncated() {
        let body = format!("<html><body><p>{}</p></body></html>", "x".repeat(2_000));
        let err = classify(&html(502, &body)).outcome.unwrap_err();
        let message = err.to_string();
        let detail = message
            .split("Data from server:\n")
            .nth(1)
            .unwrap()
            .trim_end();
        assert_eq!(detail.chars().count(), HTML_DETAIL_LIMIT);
    }

    #[test]
    fn html_braces_are_escaped() {
        let err = classify(&html(500, "<p>{oops}</p>")).outcome.unwrap_err();
        assert!(err.to_string().contains("{{oops}}"));
    }

    // ==================== Empty / Other Tests ====================

    #[test]
    fn empty_200_and_204_are_success() {
        for status in [200, 204] {
            let outcome = classify(&RawResponse::new(status, "")).outcome.unwrap();
            assert_eq!(outcome, json!({}));
        }
    }

    #[test]
    fn empty_other_status_is_error() {
        let err = classify(&RawResponse::new(409, "")).outcome.unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse { status: 409, .. }));
        assert_eq!(
            err.to_string(),
            "Empty response and no information in the header"
        );
    }

    #[test]
    fn unclassified_body_is_error() {
        let raw = RawResponse::new(200, "plain {text}").with_header("content-type", "text/plain");
        let err = classify(&raw).outcome.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't process response from server. Status Code: 200 Data from server: plain {{text}}"
        );
    }

    #[test]
    fn debug_context_is_kept_on_success_and_failure() {
        let ok = classify(&RawResponse::json(200, &json!({"a": 1})));
        assert_eq!(ok.debug.status, 200);
        assert!(ok
            .debug
            .headers
            .contains(&("content-type".to_string(), "application/json".to_string())));

        let failed = classify(&RawResponse::new(503, "down").with_header("content-type", "text/plain"));
        assert_eq!(failed.debug.status, 503);
        assert_eq!(failed.debug.body, "down");
    }

    #[test]
    fn failure_carries_debug_context() {
        let raw = RawResponse::json(400, &json!({"message": "Bad input"}))
            .with_header("x-transaction-id", "t-42");
        let err = classify(&raw).outcome.unwrap_err();
        let debug = err.debug_context().unwrap();

        assert_eq!(debug.status, 400);
        assert_eq!(debug.body, raw.body);
        assert!(debug
            .headers
            .contains(&("x-transaction-id".to_string(), "t-42".to_string())));
    }
}
