//! Sandbox reports and URL category listing.

use serde_json::Value;
use tracing::info;

use crate::client::{GatewayClient, SANDBOX_REPORT_PATH};
use crate::error::{GatewayError, Result};
use crate::transport::ApiRequest;

/// Report field carrying the analysis details.
pub const FULL_DETAILS_FIELD: &str = "Full Details";

/// Text the gateway puts in `Full Details` for hashes it has no report for.
pub const MD5_UNKNOWN_MESSAGE: &str = "md5 is unknown or analysis has yet not been completed";

/// Success message for a fetched report.
pub const REPORT_FETCHED_MESSAGE: &str =
    "Sandbox report successfully fetched for the provided md5 hash";

/// Fetches the full sandbox report for an MD5 hash.
pub fn sandbox_report(client: &GatewayClient, file_hash: &str) -> Result<Value> {
    let file_hash = file_hash.trim();
    if file_hash.is_empty() {
        return Err(GatewayError::Validation(
            "Please provide a valid file hash".to_string(),
        ));
    }

    let reply = client.send(
        ApiRequest::get(format!("{}/{}", SANDBOX_REPORT_PATH, file_hash))
            .with_query("details", "full"),
    )?;

    if let Some(details) = reply.payload.get(FULL_DETAILS_FIELD).and_then(Value::as_str) {
        if details.contains(MD5_UNKNOWN_MESSAGE) {
            return Err(GatewayError::NotFound(details.to_string()));
        }
    }

    info!(file_hash, "Sandbox report fetched");
    Ok(reply.payload)
}

/// All URL categories as raw records.
pub fn list_url_categories(client: &GatewayClient) -> Result<Vec<Value>> {
    let records = client.category_records()?;
    info!(count = records.len(), "Listed URL categories");
    Ok(records)
}
