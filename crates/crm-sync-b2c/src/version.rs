//! Normalised view of remote code versions and import executions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{B2cError, B2cResult};

/// The fields of a remote version record that crm-sync displays.
///
/// Deserialising drops every other field of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modification_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_dav_url: Option<String>,
}

impl VersionSummary {
    /// Project a raw record onto the summary fields.
    pub fn project(record: &Value) -> B2cResult<Self> {
        Self::deserialize(record).map_err(|e| B2cError::decode(e.to_string()))
    }

    /// Project every record in a listing, skipping records without an id.
    #[must_use]
    pub fn project_all(records: &[Value]) -> Vec<Self> {
        records
            .iter()
            .filter_map(|record| Self::project(record).ok())
            .collect()
    }
}

/// Find the record with the given id and project it.
pub fn find_version(records: &[Value], id: &str) -> B2cResult<(Value, VersionSummary)> {
    let record = records
        .iter()
        .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
        .ok_or_else(|| B2cError::VersionNotFound(id.to_owned()))?;

    let summary = VersionSummary::project(record)?;
    Ok((record.clone(), summary))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn listing() -> Vec<Value> {
        vec![
            json!({
                "id": "v6",
                "active": false,
                "rollback": true,
                "last_modification_time": "2021-03-01T10:00:00.000Z"
            }),
            json!({
                "id": "v7",
                "active": true,
                "activation_time": "2021-03-02T10:00:00.000Z",
                "last_modification_time": "2021-03-02T09:59:00.000Z",
                "compatibility_mode": "21.2",
                "cartridges": ["int_b2ccrmsync"],
                "total_size": 1024,
                "web_dav_url": "https://host/on/demandware.servlet/webdav/Sites/Cartridges/v7"
            }),
        ]
    }

    #[test]
    fn projection_keeps_only_allow_listed_fields() {
        let (raw, summary) = find_version(&listing(), "v7").unwrap();
        assert_eq!(summary.id, "v7");
        assert!(summary.active);
        assert_eq!(summary.compatibility_mode.as_deref(), Some("21.2"));

        let projected = serde_json::to_value(&summary).unwrap();
        let projected = projected.as_object().unwrap();
        assert_eq!(projected.len(), 5);
        for (key, value) in projected {
            assert_eq!(raw.get(key), Some(value));
        }
    }

    #[test]
    fn missing_optional_fields_are_omitted() {
        let (_, summary) = find_version(&listing(), "v6").unwrap();
        assert_eq!(summary.compatibility_mode, None);
        let projected = serde_json::to_value(&summary).unwrap();
        assert!(projected.get("web_dav_url").is_none());
    }

    #[test]
    fn absent_version_is_reported() {
        let err = find_version(&listing(), "v8").unwrap_err();
        assert!(matches!(err, B2cError::VersionNotFound(id) if id == "v8"));
    }

    #[test]
    fn project_all_skips_malformed_records() {
        let mut records = listing();
        records.push(json!({ "active": true }));
        assert_eq!(VersionSummary::project_all(&records).len(), 2);
    }
}
