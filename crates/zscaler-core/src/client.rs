//! Authenticated gateway client.
//!
//! [`GatewayClient`] pairs the [`Executor`] with the current [`Session`]:
//! every call after login carries the session cookie, and no call is made
//! without one.

use serde_json::Value;
use tracing::info;

use crate::config::{GatewayConfig, RetryPolicy};
use crate::error::{GatewayError, Result};
use crate::models::{find_category, string_list, Category};
use crate::retry::{Executor, Reply, Sleeper};
use crate::session::{self, Session};
use crate::transport::{ApiRequest, Transport};

/// Advanced security settings, holding the block list.
pub const BLOCKLIST_PATH: &str = "/api/v1/security/advanced";
/// Incremental block-list update.
pub const BLOCKLIST_WRITE_PATH: &str = "/api/v1/security/advanced/blacklistUrls";
/// Security settings, holding the allow list.
pub const ALLOWLIST_PATH: &str = "/api/v1/security";
/// URL categories collection.
pub const CATEGORIES_PATH: &str = "/api/v1/urlCategories";
/// URL categorization lookup.
pub const URL_LOOKUP_PATH: &str = "/api/v1/urlLookup";
/// Sandbox report by MD5 hash.
pub const SANDBOX_REPORT_PATH: &str = "/api/v1/sandbox/report";

/// Block-list field in the advanced security settings.
pub const BLOCKLIST_FIELD: &str = "blacklistUrls";
/// Allow-list field in the security settings.
pub const ALLOWLIST_FIELD: &str = "whitelistUrls";

/// Gateway client bound to at most one session.
pub struct GatewayClient {
    executor: Executor,
    session: Option<Session>,
}

impl GatewayClient {
    /// Creates a client with no session.
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            session: None,
        }
    }

    /// Creates a client from its transport, sleeper and retry policy.
    pub fn with_parts(
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self::new(Executor::new(transport, sleeper, policy))
    }

    /// Logs in and keeps the session for later calls.
    pub fn login(&mut self, config: &GatewayConfig) -> Result<&Session> {
        let session = session::establish(&self.executor, config)?;
        Ok(self.session.insert(session))
    }

    /// Uses an already established session.
    pub fn attach(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Logs out if a session is open. Never fails.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            session::teardown(&self.executor, &session);
        }
    }

    /// The current session, if logged in.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Sends an authenticated request.
    pub fn send(&self, mut request: ApiRequest) -> Result<Reply> {
        let session = self.session.as_ref().ok_or_else(|| {
            GatewayError::Auth("No active Zscaler session; login is required".to_string())
        })?;
        request.headers.extend(session.auth_headers());
        self.executor.execute(&request)
    }

    // ==================== Lists ====================

    /// Current block list.
    pub fn blocklist(&self) -> Result<Vec<String>> {
        let reply = self.send(ApiRequest::get(BLOCKLIST_PATH))?;
        Ok(string_list(&reply.payload, BLOCKLIST_FIELD))
    }

    /// Current allow list.
    pub fn allowlist(&self) -> Result<Vec<String>> {
        let reply = self.send(ApiRequest::get(ALLOWLIST_PATH))?;
        Ok(string_list(&reply.payload, ALLOWLIST_FIELD))
    }

    // ==================== Categories ====================

    /// All URL categories as raw records.
    pub fn category_records(&self) -> Result<Vec<Value>> {
        let reply = self.send(ApiRequest::get(CATEGORIES_PATH))?;
        match reply.payload {
            Value::Array(records) => Ok(records),
            Value::Object(map) if map.is_empty() => Ok(Vec::new()),
            other => Err(GatewayError::MalformedResponse {
                status: reply.status,
                message: format!("Unexpected URL categories payload: {}", other),
                debug: Some(Box::new(reply.debug)),
            }),
        }
    }

    /// One URL category, by configured name and then by id. Only the
    /// matched record is parsed.
    pub fn category(&self, name_or_id: &str) -> Result<Option<Category>> {
        let records = self.category_records()?;
        let Some(record) = find_category(&records, name_or_id) else {
            return Ok(None);
        };
        let category = serde_json::from_value(record.clone())?;
        Ok(Some(category))
    }

    /// Replaces a category record.
    pub fn update_category(&self, category: &Category) -> Result<Reply> {
        let body = serde_json::to_value(category)?;
        info!(category = %category.id, "Updating URL category");
        self.send(ApiRequest::put(format!("{}/{}", CATEGORIES_PATH, category.id)).with_json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSleeper, ScriptedTransport};
    use crate::transport::RawResponse;
    use serde_json::json;

    fn client(transport: &ScriptedTransport) -> GatewayClient {
        GatewayClient::with_parts(
            Box::new(transport.clone()),
            Box::new(RecordingSleeper::new()),
            RetryPolicy::unbounded(),
        )
    }

    #[test]
    fn test_send_without_session_makes_no_call() {
        let transport = ScriptedTransport::new();
        let err = client(&transport)
            .send(ApiRequest::get(ALLOWLIST_PATH))
            .unwrap_err();

        assert!(matches!(err, GatewayError::Auth(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_send_attaches_cookie() {
        let transport = ScriptedTransport::new();
        transport.push(RawResponse::json(200, &json!({"whitelistUrls": ["a.com"]})));
        let mut client = client(&transport);
        client.attach(Session::new("https://x", "JSESSIONID=1"));

        assert_eq!(client.allowlist().unwrap(), vec!["a.com"]);
        assert_eq!(
            transport.requests()[0].headers,
            vec![("cookie".to_string(), "JSESSIONID=1".to_string())]
        );
    }

    #[test]
    fn test_login_failure_leaves_no_session() {
        let transport = ScriptedTransport::new();
        transport.push(RawResponse::json(401, &json!({"message": "nope"})));
        let mut client = client(&transport);
        let config = GatewayConfig::new("https://x", "u", "p", "abcdefghijklmnop");

        assert!(client.login(&config).is_err());
        assert!(client.session().is_none());
    }

    #[test]
    fn test_logout_without_session_is_noop() {
        let transport = ScriptedTransport::new();
        let mut client = client(&transport);
        client.logout();
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_category_parses_only_the_match() {
        let transport = ScriptedTransport::new();
        transport.push(RawResponse::json(
            200,
            &json!([
                {"id": "NEWS_AND_MEDIA", "dbCategorizedUrls": "not-a-list"},
                {"id": "CUSTOM_01", "configuredName": "Custom", "dbCategorizedUrls": ["a.com"]}
            ]),
        ));
        let mut client = client(&transport);
        client.attach(Session::new("https://x", "JSESSIONID=1"));

        let category = client.category("Custom").unwrap().unwrap();
        assert_eq!(category.id, "CUSTOM_01");
        assert_eq!(category.db_categorized_urls, vec!["a.com"]);
    }

    #[test]
    fn test_category_missing_is_none() {
        let transport = ScriptedTransport::new();
        transport.push(RawResponse::json(200, &json!([{"id": "CUSTOM_01"}])));
        let mut client = client(&transport);
        client.attach(Session::new("https://x", "JSESSIONID=1"));

        assert!(client.category("Other").unwrap().is_none());
    }
}
