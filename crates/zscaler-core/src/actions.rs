//! Action dispatch.
//!
//! Each host action is an [`ActionId`]; [`ActionId::handle`] runs it against
//! an authenticated [`GatewayClient`] and always returns an [`ActionResult`].
//! Errors become failed results and never escape the action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::client::GatewayClient;
use crate::endpoints::{prepare, require_endpoints, split_endpoints, EndpointKind};
use crate::error::{GatewayError, Result};
use crate::lists::{amend, ListAction, ListTarget, MutationRequest};
use crate::lookup::lookup;
use crate::reports::{list_url_categories, sandbox_report, REPORT_FETCHED_MESSAGE};
use crate::response::DebugContext;

/// Flat parameter mapping handed to an action.
pub type Parameters = Map<String, Value>;

/// Optional parameter naming a URL category to mutate instead of a list.
pub const URL_CATEGORY_PARAM: &str = "url_category";

/// Actions the connector supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    TestConnectivity,
    ListUrlCategories,
    GetReport,
    BlockIp,
    BlockUrl,
    UnblockIp,
    UnblockUrl,
    AllowIp,
    AllowUrl,
    UnallowIp,
    UnallowUrl,
    LookupIp,
    LookupUrl,
}

impl ActionId {
    /// Every action, in dispatch order.
    pub const ALL: [ActionId; 13] = [
        Self::TestConnectivity,
        Self::ListUrlCategories,
        Self::GetReport,
        Self::BlockIp,
        Self::BlockUrl,
        Self::UnblockIp,
        Self::UnblockUrl,
        Self::AllowIp,
        Self::AllowUrl,
        Self::UnallowIp,
        Self::UnallowUrl,
        Self::LookupIp,
        Self::LookupUrl,
    ];

    /// Host-facing identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TestConnectivity => "test_connectivity",
            Self::ListUrlCategories => "list_url_categories",
            Self::GetReport => "get_report",
            Self::BlockIp => "block_ip",
            Self::BlockUrl => "block_url",
            Self::UnblockIp => "unblock_ip",
            Self::UnblockUrl => "unblock_url",
            Self::AllowIp => "allow_ip",
            Self::AllowUrl => "allow_url",
            Self::UnallowIp => "unallow_ip",
            Self::UnallowUrl => "unallow_url",
            Self::LookupIp => "lookup_ip",
            Self::LookupUrl => "lookup_url",
        }
    }

    /// Kind of endpoint the action takes, if any.
    pub fn endpoint_kind(&self) -> Option<EndpointKind> {
        match self {
            Self::BlockIp | Self::UnblockIp | Self::AllowIp | Self::UnallowIp | Self::LookupIp => {
                Some(EndpointKind::Ip)
            }
            Self::BlockUrl
            | Self::UnblockUrl
            | Self::AllowUrl
            | Self::UnallowUrl
            | Self::LookupUrl => Some(EndpointKind::Url),
            Self::TestConnectivity | Self::ListUrlCategories | Self::GetReport => None,
        }
    }

    /// Runs the action. Failures are reported in the result.
    pub fn handle(self, client: &GatewayClient, params: &Parameters) -> ActionResult {
        info!(action = self.as_str(), "Running action");
        match self.execute(client, params) {
            Ok(result) => result,
            Err(e) => {
                warn!(action = self.as_str(), error = %e, "Action failed");
                ActionResult::failure(self.as_str(), params.clone(), &e)
            }
        }
    }

    fn execute(self, client: &GatewayClient, params: &Parameters) -> Result<ActionResult> {
        let result = ActionResult::success(self, params.clone());
        match self {
            Self::TestConnectivity => Ok(result.with_message("Test Connectivity Passed")),
            Self::ListUrlCategories => {
                let records = list_url_categories(client)?;
                let total = records.len();
                Ok(result
                    .with_records(records)
                    .with_summary("total_url_categories", total))
            }
            Self::GetReport => {
                let report = sandbox_report(client, required(params, "file_hash")?)?;
                Ok(result.with_data(report).with_message(REPORT_FETCHED_MESSAGE))
            }
            Self::BlockIp | Self::BlockUrl => {
                self.amend_list(client, params, result, ListAction::AddToList, ListTarget::blocklist_or)
            }
            Self::UnblockIp | Self::UnblockUrl => self.amend_list(
                client,
                params,
                result,
                ListAction::RemoveFromList,
                ListTarget::blocklist_or,
            ),
            Self::AllowIp | Self::AllowUrl => {
                self.amend_list(client, params, result, ListAction::AddToList, ListTarget::allowlist_or)
            }
            Self::UnallowIp | Self::UnallowUrl => self.amend_list(
                client,
                params,
                result,
                ListAction::RemoveFromList,
                ListTarget::allowlist_or,
            ),
            Self::LookupIp => {
                let endpoints = split_endpoints(required(params, "ip")?);
                let records = lookup(client, &endpoints)?;
                Ok(result
                    .with_records(records)
                    .with_message("Successfully completed lookup"))
            }
            Self::LookupUrl => {
                let endpoints = prepare(required(params, "url")?, EndpointKind::Url)?;
                let records = lookup(client, &endpoints)?;
                Ok(result
                    .with_records(records)
                    .with_message("Successfully completed lookup"))
            }
        }
    }

    fn amend_list(
        self,
        client: &GatewayClient,
        params: &Parameters,
        result: ActionResult,
        action: ListAction,
        target: fn(Option<String>) -> ListTarget,
    ) -> Result<ActionResult> {
        let kind = self.endpoint_kind().unwrap_or(EndpointKind::Url);
        let param = match kind {
            EndpointKind::Ip => "ip",
            EndpointKind::Url => "url",
        };
        let endpoints = require_endpoints(prepare(required(params, param)?, kind)?)?;
        let category = optional(params, URL_CATEGORY_PARAM).map(str::to_string);
        let target = target(category);
        let label = target.label();

        let outcome = amend(
            client,
            &MutationRequest {
                endpoints,
                action,
                target,
            },
        )?;

        let message = outcome.message.unwrap_or_else(|| {
            format!(
                "{} updated: {} endpoint(s) changed, {} ignored",
                label,
                outcome.updated.len(),
                outcome.ignored.len()
            )
        });
        let mut result = result
            .with_summary("updated", outcome.updated)
            .with_summary("ignored", outcome.ignored)
            .with_message(message);
        if let Some(data) = outcome.data {
            result = result.with_data(data);
        }
        Ok(result)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| GatewayError::Validation(format!("Unsupported action '{}'", s)))
    }
}

fn required<'a>(params: &'a Parameters, name: &str) -> Result<&'a str> {
    optional(params, name)
        .ok_or_else(|| GatewayError::Validation(format!("Missing required parameter '{}'", name)))
}

fn optional<'a>(params: &'a Parameters, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// Outcome status reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Failed,
}

/// Structured outcome of one action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub action: String,
    pub status: ActionStatus,
    pub message: String,
    pub summary: Map<String, Value>,
    pub data: Vec<Value>,
    pub parameters: Parameters,
    /// Raw exchange behind a failed call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugContext>,
}

impl ActionResult {
    /// An empty successful result.
    pub fn success(action: ActionId, parameters: Parameters) -> Self {
        Self {
            action: action.as_str().to_string(),
            status: ActionStatus::Success,
            message: String::new(),
            summary: Map::new(),
            data: Vec::new(),
            parameters,
            debug: None,
        }
    }

    /// A failed result carrying the error's message and, for response
    /// failures, the raw exchange.
    pub fn failure(action: &str, parameters: Parameters, error: &GatewayError) -> Self {
        Self {
            action: action.to_string(),
            status: ActionStatus::Failed,
            message: error.to_string(),
            summary: Map::new(),
            data: Vec::new(),
            parameters,
            debug: error.debug_context().cloned(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_summary(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.summary.insert(key.to_string(), value.into());
        self
    }

    pub fn with_data(mut self, record: Value) -> Self {
        self.data.push(record);
        self
    }

    pub fn with_records(mut self, records: Vec<Value>) -> Self {
        self.data.extend(records);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}
