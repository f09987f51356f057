//! Gateway API payload types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A URL category record.
///
/// The API has no partial update, so every field the server sent is kept in
/// `extra` and written back untouched alongside the edited URL set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(
        rename = "configuredName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub configured_name: Option<String>,
    #[serde(rename = "dbCategorizedUrls", default, deserialize_with = "null_as_empty")]
    pub db_categorized_urls: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Finds a raw category record by configured name, falling back to an exact
/// id match. Only the two string fields are inspected, so records that would
/// not parse as a [`Category`] never block the search.
pub fn find_category<'a>(records: &'a [Value], name_or_id: &str) -> Option<&'a Value> {
    let field_is = |record: &Value, field: &str| {
        record.get(field).and_then(Value::as_str) == Some(name_or_id)
    };
    records
        .iter()
        .find(|record| field_is(*record, "configuredName"))
        .or_else(|| records.iter().find(|record| field_is(*record, "id")))
}

/// Reads a list of strings from `payload[field]`; missing or non-string
/// entries are skipped.
pub fn string_list(payload: &Value, field: &str) -> Vec<String> {
    payload
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![
            json!({"id": "CUSTOM_01", "configuredName": "Blocked Sites", "dbCategorizedUrls": ["a.com"]}),
            json!({"id": "CUSTOM_02", "configuredName": "CUSTOM_01", "superCategory": "USER_DEFINED"}),
            json!({"id": "NEWS_AND_MEDIA"}),
        ]
    }

    #[test]
    fn category_round_trips_unknown_fields() {
        let raw = json!({
            "id": "CUSTOM_02",
            "configuredName": "Test",
            "dbCategorizedUrls": ["x.com"],
            "superCategory": "USER_DEFINED",
            "keywords": ["k"],
            "customCategory": true
        });
        let category: Category = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(category.extra["superCategory"], "USER_DEFINED");
        assert_eq!(serde_json::to_value(&category).unwrap(), raw);
    }

    #[test]
    fn missing_or_null_urls_parse_as_empty() {
        let category: Category = serde_json::from_value(json!({"id": "NEWS_AND_MEDIA"})).unwrap();
        assert!(category.db_categorized_urls.is_empty());

        let category: Category =
            serde_json::from_value(json!({"id": "NEWS_AND_MEDIA", "dbCategorizedUrls": null}))
                .unwrap();
        assert!(category.db_categorized_urls.is_empty());
    }

    #[test]
    fn find_prefers_configured_name_over_id() {
        let records = records();
        // "CUSTOM_01" is both an id and another category's configured name.
        assert_eq!(find_category(&records, "CUSTOM_01").unwrap()["id"], "CUSTOM_02");
        assert_eq!(find_category(&records, "Blocked Sites").unwrap()["id"], "CUSTOM_01");
    }

    #[test]
    fn find_falls_back_to_id() {
        let records = records();
        assert_eq!(find_category(&records, "NEWS_AND_MEDIA").unwrap()["id"], "NEWS_AND_MEDIA");
        assert!(find_category(&records, "missing").is_none());
    }

    #[test]
    fn find_skips_records_with_odd_shapes() {
        let records = vec![
            json!({"id": 7, "dbCategorizedUrls": [1, 2]}),
            json!("not a record"),
            json!({"id": "CUSTOM_09", "configuredName": "Phishing"}),
        ];
        assert_eq!(find_category(&records, "Phishing").unwrap()["id"], "CUSTOM_09");
    }

    #[test]
    fn string_list_tolerates_missing_field() {
        assert_eq!(string_list(&json!({}), "blacklistUrls"), Vec::<String>::new());
        assert_eq!(
            string_list(&json!({"blacklistUrls": ["a.com", 5, "b.com"]}), "blacklistUrls"),
            vec!["a.com", "b.com"]
        );
    }
}
