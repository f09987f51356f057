//! Endpoint input normalization.
//!
//! Action parameters carry IPs and URLs as one comma-separated string.
//! Entries are trimmed, empty ones dropped, and a leading `http://` or
//! `https://` removed. URL actions additionally reject the whole batch if
//! any entry is longer than [`MAX_ENDPOINT_LENGTH`] characters.

use crate::error::{GatewayError, Result};

/// Maximum length of a single URL entry.
pub const MAX_ENDPOINT_LENGTH: usize = 1024;

/// Message for batches containing an over-long entry.
pub const OVERLENGTH_MESSAGE: &str = "Please provide valid comma-separated values in the action parameter. Max allowed length for each value is 1024.";

/// Message for mutation input that normalizes to no endpoints.
pub const EMPTY_ENDPOINTS_MESSAGE: &str =
    "Please provide valid comma-separated values in the action parameter.";

const SCHEMES: [&str; 2] = ["http://", "https://"];

/// Which kind of endpoint an action works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Ip,
    Url,
}

/// Splits on commas, trims, and drops empty entries. Order is preserved.
pub fn split_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes one leading `http://` or `https://` (exact, case-sensitive).
pub fn strip_scheme(endpoint: &str) -> &str {
    SCHEMES
        .iter()
        .find_map(|scheme| endpoint.strip_prefix(*scheme))
        .unwrap_or(endpoint)
}

/// Splits and strips schemes. A bare scheme leaves nothing and is dropped.
pub fn normalize(raw: &str) -> Vec<String> {
    split_endpoints(raw)
        .iter()
        .map(String::as_str)
        .map(strip_scheme)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fails if any entry exceeds [`MAX_ENDPOINT_LENGTH`] characters.
pub fn check_length(endpoints: &[String]) -> Result<()> {
    if endpoints
        .iter()
        .any(|e| e.chars().count() > MAX_ENDPOINT_LENGTH)
    {
        return Err(GatewayError::Validation(OVERLENGTH_MESSAGE.to_string()));
    }
    Ok(())
}

/// Normalizes input for a list mutation.
pub fn prepare(raw: &str, kind: EndpointKind) -> Result<Vec<String>> {
    let endpoints = normalize(raw);
    if kind == EndpointKind::Url {
        check_length(&endpoints)?;
    }
    Ok(endpoints)
}

/// Fails if a mutation has nothing left to act on.
pub fn require_endpoints(endpoints: Vec<String>) -> Result<Vec<String>> {
    if endpoints.is_empty() {
        return Err(GatewayError::Validation(EMPTY_ENDPOINTS_MESSAGE.to_string()));
    }
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_trims_and_drops_empty() {
        assert_eq!(
            split_endpoints(" 1.2.3.4 , ,5.6.7.8,, "),
            vec!["1.2.3.4", "5.6.7.8"]
        );
        assert!(split_endpoints(" , ").is_empty());
    }

    #[test]
    fn strip_scheme_exact_prefix_only() {
        assert_eq!(strip_scheme("http://a.com"), "a.com");
        assert_eq!(strip_scheme("https://b.com/path"), "b.com/path");
        assert_eq!(strip_scheme("HTTP://c.com"), "HTTP://c.com");
        assert_eq!(strip_scheme("ftp://d.com"), "ftp://d.com");
        assert_eq!(strip_scheme("a.com/http://x"), "a.com/http://x");
    }

    #[test]
    fn strip_scheme_removes_only_one_prefix() {
        assert_eq!(strip_scheme("http://https://a.com"), "https://a.com");
    }

    #[test]
    fn normalize_mixed_input() {
        assert_eq!(
            normalize("http://a.com, https://b.com,c.com"),
            vec!["a.com", "b.com", "c.com"]
        );
    }

    #[test]
    fn normalize_never_yields_blank_or_schemed_entries() {
        let inputs = [
            "http://, https:// ,  ",
            "https://x.org,\thttp://y.org\t,",
            ",,,http://z.net",
        ];
        for input in inputs {
            for entry in normalize(input) {
                assert!(!entry.trim().is_empty());
                assert!(!entry.starts_with("http://"));
                assert!(!entry.starts_with("https://"));
            }
        }
    }

    #[test]
    fn normalize_trims_before_stripping_only() {
        assert_eq!(normalize("http:// a.com"), vec![" a.com"]);
        assert_eq!(normalize(" https://b.com "), vec!["b.com"]);
    }

    #[test]
    fn require_endpoints_rejects_empty_batch() {
        let err = require_endpoints(normalize(" , http:// ,")).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(err.to_string(), EMPTY_ENDPOINTS_MESSAGE);
        assert_eq!(require_endpoints(normalize("a.com")).unwrap(), vec!["a.com"]);
    }

    #[test]
    fn length_limit_is_inclusive() {
        let ok = vec!["a".repeat(MAX_ENDPOINT_LENGTH)];
        assert!(check_length(&ok).is_ok());

        let too_long = vec!["a.com".to_string(), "a".repeat(MAX_ENDPOINT_LENGTH + 1)];
        let err = check_length(&too_long).unwrap_err();
        assert_eq!(err.to_string(), OVERLENGTH_MESSAGE);
    }

    #[test]
    fn prepare_checks_length_for_urls_only() {
        let long = "1".repeat(MAX_ENDPOINT_LENGTH + 1);
        assert!(prepare(&long, EndpointKind::Url).is_err());
        assert_eq!(prepare(&long, EndpointKind::Ip).unwrap(), vec![long.clone()]);
    }

    #[test]
    fn length_counts_after_scheme_strip() {
        let raw = format!("https://{}", "a".repeat(MAX_ENDPOINT_LENGTH));
        assert!(prepare(&raw, EndpointKind::Url).is_ok());
    }
}
