//! List mutation engine.
//!
//! Block list, allow list and URL categories are all edited the same way:
//!
//! 1. fetch the current list fresh from the gateway
//! 2. split the requested endpoints into `to_write` and `ignored`
//! 3. stop early if there is nothing to write
//! 4. write the change back
//! 5. report `updated = to_write` and `ignored`
//!
//! What "write back" means differs per list and lives in a [`ListAccessor`]:
//! the block list takes an incremental update, while the allow list and
//! categories are replaced whole.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::{
    GatewayClient, ALLOWLIST_FIELD, ALLOWLIST_PATH, BLOCKLIST_FIELD, BLOCKLIST_WRITE_PATH,
};
use crate::error::{GatewayError, Result};
use crate::models::Category;
use crate::retry::Reply;
use crate::transport::ApiRequest;

/// Direction of a list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListAction {
    AddToList,
    RemoveFromList,
}

impl ListAction {
    /// Wire name used by the gateway.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddToList => "ADD_TO_LIST",
            Self::RemoveFromList => "REMOVE_FROM_LIST",
        }
    }
}

/// Which server-side collection to mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListTarget {
    Blocklist,
    Allowlist,
    /// A URL category, by configured name or id.
    Category(String),
}

impl ListTarget {
    /// Block list, or the named category when one is given.
    pub fn blocklist_or(category: Option<String>) -> Self {
        category.map_or(Self::Blocklist, Self::Category)
    }

    /// Allow list, or the named category when one is given.
    pub fn allowlist_or(category: Option<String>) -> Self {
        category.map_or(Self::Allowlist, Self::Category)
    }

    /// Name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Blocklist => "Blocklist",
            Self::Allowlist => "Allowlist",
            Self::Category(_) => "Category",
        }
    }
}

/// A requested change to one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub endpoints: Vec<String>,
    pub action: ListAction,
    pub target: ListTarget,
}

/// Requested endpoints split by whether they need writing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub to_write: Vec<String>,
    pub ignored: Vec<String>,
}

/// Outcome of a mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationResult {
    /// Endpoints actually added or removed.
    pub updated: Vec<String>,
    /// Endpoints already present (add) or absent (remove).
    pub ignored: Vec<String>,
    /// Set when nothing was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Write response, for lists whose writes return the new record.
    #[serde(skip)]
    pub data: Option<Value>,
}

/// Splits `requested` against `existing`.
///
/// Add writes `requested − existing`; remove writes `requested ∩ existing`.
/// Everything else is ignored. Request order is kept and duplicates dropped.
pub fn compute_delta(requested: &[String], existing: &[String], action: ListAction) -> Delta {
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut delta = Delta::default();

    for endpoint in requested {
        if !seen.insert(endpoint.as_str()) {
            continue;
        }
        let present = existing.contains(endpoint.as_str());
        let write = match action {
            ListAction::AddToList => !present,
            ListAction::RemoveFromList => present,
        };
        if write {
            delta.to_write.push(endpoint.clone());
        } else {
            delta.ignored.push(endpoint.clone());
        }
    }

    delta
}

/// Full list after applying `to_write`: `existing ∪ to_write` or `existing − to_write`.
pub fn apply_delta(existing: &[String], to_write: &[String], action: ListAction) -> Vec<String> {
    let mut seen = HashSet::new();
    match action {
        ListAction::AddToList => existing
            .iter()
            .chain(to_write)
            .filter(|e| seen.insert(e.as_str()))
            .cloned()
            .collect(),
        ListAction::RemoveFromList => {
            let removed: HashSet<&str> = to_write.iter().map(String::as_str).collect();
            existing
                .iter()
                .filter(|e| !removed.contains(e.as_str()))
                .filter(|e| seen.insert(e.as_str()))
                .cloned()
                .collect()
        }
    }
}

/// Reads and writes one server-side list.
pub trait ListAccessor {
    /// Name used in messages (`Blocklist`, `Allowlist`, `Category`).
    fn label(&self) -> &'static str;

    /// Fetches the current list.
    fn fetch(&mut self, client: &GatewayClient) -> Result<Vec<String>>;

    /// Writes the change. `full` is the complete list after the change.
    fn write(
        &mut self,
        client: &GatewayClient,
        action: ListAction,
        to_write: &[String],
        full: Vec<String>,
    ) -> Result<Reply>;

    /// Whether the write response should be reported as data.
    fn reports_write_response(&self) -> bool {
        true
    }
}

/// Advanced-settings block list; writes are incremental.
#[derive(Debug, Default)]
pub struct BlocklistAccessor;

impl ListAccessor for BlocklistAccessor {
    fn label(&self) -> &'static str {
        "Blocklist"
    }

    fn fetch(&mut self, client: &GatewayClient) -> Result<Vec<String>> {
        client.blocklist()
    }

    fn write(
        &mut self,
        client: &GatewayClient,
        action: ListAction,
        to_write: &[String],
        _full: Vec<String>,
    ) -> Result<Reply> {
        client.send(
            ApiRequest::post(BLOCKLIST_WRITE_PATH)
                .with_query("action", action.as_str())
                .with_json(json!({ BLOCKLIST_FIELD: to_write })),
        )
    }

    fn reports_write_response(&self) -> bool {
        false
    }
}

/// Security-settings allow list; writes replace the whole list.
#[derive(Debug, Default)]
pub struct AllowlistAccessor;

impl ListAccessor for AllowlistAccessor {
    fn label(&self) -> &'static str {
        "Allowlist"
    }

    fn fetch(&mut self, client: &GatewayClient) -> Result<Vec<String>> {
        client.allowlist()
    }

    fn write(
        &mut self,
        client: &GatewayClient,
        _action: ListAction,
        _to_write: &[String],
        full: Vec<String>,
    ) -> Result<Reply> {
        client.send(ApiRequest::put(ALLOWLIST_PATH).with_json(json!({ ALLOWLIST_FIELD: full })))
    }
}

/// A URL category's `dbCategorizedUrls`; writes replace the whole record.
#[derive(Debug)]
pub struct CategoryAccessor {
    name_or_id: String,
    category: Option<Category>,
}

impl CategoryAccessor {
    pub fn new(name_or_id: impl Into<String>) -> Self {
        Self {
            name_or_id: name_or_id.into(),
            category: None,
        }
    }
}

impl ListAccessor for CategoryAccessor {
    fn label(&self) -> &'static str {
        "Category"
    }

    fn fetch(&mut self, client: &GatewayClient) -> Result<Vec<String>> {
        let category = client.category(&self.name_or_id)?.ok_or_else(|| {
            GatewayError::NotFound(format!("Unable to find category '{}'", self.name_or_id))
        })?;

        debug!(category = %category.id, "Resolved URL category");
        let urls = category.db_categorized_urls.clone();
        self.category = Some(category);
        Ok(urls)
    }

    fn write(
        &mut self,
        client: &GatewayClient,
        _action: ListAction,
        _to_write: &[String],
        full: Vec<String>,
    ) -> Result<Reply> {
        let mut category = self.category.take().ok_or_else(|| {
            GatewayError::NotFound(format!("Unable to find category '{}'", self.name_or_id))
        })?;
        category.db_categorized_urls = full;
        client.update_category(&category)
    }
}

/// Runs the fetch / filter / write protocol against one accessor.
pub fn mutate(
    client: &GatewayClient,
    accessor: &mut dyn ListAccessor,
    requested: &[String],
    action: ListAction,
) -> Result<MutationResult> {
    let existing = accessor.fetch(client)?;
    let delta = compute_delta(requested, &existing, action);

    if delta.to_write.is_empty() {
        let message = match action {
            ListAction::AddToList => format!("{} contains all of these endpoints", accessor.label()),
            ListAction::RemoveFromList => {
                format!("{} contains none of these endpoints", accessor.label())
            }
        };
        info!(list = accessor.label(), "{}", message);
        return Ok(MutationResult {
            updated: Vec::new(),
            ignored: delta.ignored,
            message: Some(message),
            data: None,
        });
    }

    let full = apply_delta(&existing, &delta.to_write, action);
    let data = match accessor.write(client, action, &delta.to_write, full) {
        Ok(reply) => accessor.reports_write_response().then_some(reply.payload),
        // Some list endpoints answer a successful write with a bare 204.
        Err(e) if e.status() == Some(204) => {
            debug!(list = accessor.label(), "Write answered 204, treating as success");
            None
        }
        Err(e) => return Err(e),
    };

    info!(
        list = accessor.label(),
        action = action.as_str(),
        updated = delta.to_write.len(),
        ignored = delta.ignored.len(),
        "List updated"
    );

    Ok(MutationResult {
        updated: delta.to_write,
        ignored: delta.ignored,
        message: None,
        data,
    })
}

/// Applies a [`MutationRequest`] to its target list.
pub fn amend(client: &GatewayClient, request: &MutationRequest) -> Result<MutationResult> {
    let mut accessor: Box<dyn ListAccessor> = match &request.target {
        ListTarget::Blocklist => Box::new(BlocklistAccessor),
        ListTarget::Allowlist => Box::new(AllowlistAccessor),
        ListTarget::Category(name) => Box::new(CategoryAccessor::new(name.clone())),
    };
    mutate(client, accessor.as_mut(), &request.endpoints, request.action)
}
