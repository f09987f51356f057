//! URL categorization lookup annotated with block-list membership.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::client::{GatewayClient, URL_LOOKUP_PATH};
use crate::error::{GatewayError, Result};
use crate::transport::ApiRequest;

/// Field added to every lookup record.
pub const BLOCKLISTED_FIELD: &str = "blocklisted";

/// Returned when there is nothing to look up.
pub const EMPTY_LOOKUP_MESSAGE: &str = "Please provide valid list of URL(s)";

/// Looks up `endpoints` and marks each returned record with whether its
/// `url` is on the block list.
pub fn lookup(client: &GatewayClient, endpoints: &[String]) -> Result<Vec<Value>> {
    if endpoints.is_empty() {
        return Err(GatewayError::Validation(EMPTY_LOOKUP_MESSAGE.to_string()));
    }

    let reply = client.send(ApiRequest::post(URL_LOOKUP_PATH).with_json(Value::from(endpoints.to_vec())))?;
    let mut records = match reply.payload {
        Value::Array(records) => records,
        Value::Object(map) if map.is_empty() => Vec::new(),
        other => {
            return Err(GatewayError::MalformedResponse {
                status: reply.status,
                message: format!("Unexpected URL lookup payload: {}", other),
                debug: Some(Box::new(reply.debug)),
            })
        }
    };

    let blocklist = client.blocklist()?;
    let blocked: HashSet<&str> = blocklist.iter().map(String::as_str).collect();

    for record in records.iter_mut() {
        let listed = record
            .get("url")
            .and_then(Value::as_str)
            .is_some_and(|url| blocked.contains(url));
        if let Value::Object(map) = record {
            map.insert(BLOCKLISTED_FIELD.to_string(), Value::Bool(listed));
        }
    }

    debug!(records = records.len(), "URL lookup complete");
    Ok(records)
}
