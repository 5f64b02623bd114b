//! Retrieval and audit of the OCAPI settings registered for the API client.

use std::path::{Path, PathBuf};

use crm_sync_core::layout;
use crm_sync_core::{EnvironmentDefinition, Requirement};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{CommerceApi, Credentials, OcapiClient};
use crate::error::{B2cError, B2cResult};

/// Fault returned by the instance instead of a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcapiFault {
    pub status: u16,
    pub fault_type: String,
    pub message: String,
}

/// Display rows for the OCAPI configuration.
#[derive(Debug, Clone, Default)]
pub struct OcapiConfigReport {
    /// `(api_type, settings)` rows for the global configuration.
    pub global: Vec<(String, String)>,
    /// `(site id, settings)` rows for site-specific configuration.
    pub sites: Vec<(String, String)>,
    pub fault: Option<OcapiFault>,
    /// File the raw response was written to.
    pub audit_path: Option<PathBuf>,
}

/// Fetch the configuration with Business Manager credentials and audit it to
/// `<audit_dir>/<instance>.ocapi-config.json`.
pub async fn fetch_ocapi_config(
    client: &OcapiClient,
    env: &EnvironmentDefinition,
    audit_dir: &Path,
) -> B2cResult<OcapiConfigReport> {
    env.validate(&[
        Requirement::B2cConnection,
        Requirement::B2cBusinessManagerUser,
        Requirement::B2cInstanceName,
    ])?;
    let credentials = Credentials::business_manager(&env.b2c)?;
    let token = client.authenticate(&credentials).await?;

    let raw = match client.ocapi_config(&token, credentials.client_id()).await {
        Ok(raw) => raw,
        Err(B2cError::Status { status, body }) => {
            let fault = parse_fault(status, &body);
            warn!(status, fault_type = %fault.fault_type, "OCAPI configuration request rejected");
            return Ok(OcapiConfigReport {
                fault: Some(fault),
                ..OcapiConfigReport::default()
            });
        }
        Err(err) => return Err(err),
    };

    let mut report = build_report(&raw);

    let instance_name = env.b2c.instance_name()?;
    layout::ensure_dir(audit_dir)?;
    let audit_path = audit_dir.join(format!("{instance_name}.ocapi-config.json"));
    let contents = serde_json::to_string_pretty(&raw).map_err(|e| B2cError::decode(e.to_string()))?;
    std::fs::write(&audit_path, contents).map_err(|e| B2cError::io(&audit_path, e))?;

    info!(path = %audit_path.display(), "OCAPI configuration audited");
    report.audit_path = Some(audit_path);
    Ok(report)
}

/// Project a configuration response into display rows.
///
/// Without a global configuration, placeholder rows for `data` and `shop`
/// are shown.
#[must_use]
pub fn build_report(raw: &Value) -> OcapiConfigReport {
    let global_configs = raw
        .get("global")
        .and_then(Value::as_array)
        .and_then(|global| global.first())
        .and_then(|first| first.get("site_configs"))
        .and_then(Value::as_array);

    let global = match global_configs {
        Some(configs) if !configs.is_empty() => configs
            .iter()
            .map(|config| {
                let api_type = config
                    .get("api_type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                (api_type, pretty(config))
            })
            .collect(),
        _ => vec![
            ("data".to_owned(), "---".to_owned()),
            ("shop".to_owned(), "---".to_owned()),
        ],
    };

    let sites = raw
        .get("sites")
        .and_then(Value::as_array)
        .map(|sites| {
            sites
                .iter()
                .map(|config| {
                    let site_id = config
                        .get("site_id")
                        .and_then(Value::as_str)
                        .map(strip_site_id)
                        .unwrap_or_default();
                    (site_id, pretty(config))
                })
                .collect()
        })
        .unwrap_or_default();

    OcapiConfigReport {
        global,
        sites,
        fault: None,
        audit_path: None,
    }
}

/// `Sites-RefArch-Site` becomes `RefArch`.
fn strip_site_id(site_id: &str) -> String {
    let trimmed = site_id.strip_prefix("Sites-").unwrap_or(site_id);
    trimmed.strip_suffix("-Site").unwrap_or(trimmed).to_owned()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn parse_fault(status: u16, body: &str) -> OcapiFault {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let fault = parsed.as_ref().and_then(|v| v.get("fault"));
    let field = |name: &str| {
        fault
            .and_then(|f| f.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    OcapiFault {
        status,
        fault_type: field("type"),
        message: field("message"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn report_lists_global_and_site_settings() {
        let raw = json!({
            "global": [{
                "site_configs": [
                    { "api_type": "data", "resources": [] },
                    { "api_type": "shop", "resources": [] }
                ]
            }],
            "sites": [{ "site_id": "Sites-RefArch-Site", "api_type": "shop" }]
        });

        let report = build_report(&raw);
        let types: Vec<_> = report.global.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(types, ["data", "shop"]);
        assert_eq!(report.sites[0].0, "RefArch");
        assert!(report.sites[0].1.contains("\"api_type\": \"shop\""));
    }

    #[test]
    fn missing_global_configuration_shows_placeholders() {
        let report = build_report(&json!({ "global": [] }));
        assert_eq!(
            report.global,
            vec![
                ("data".to_owned(), "---".to_owned()),
                ("shop".to_owned(), "---".to_owned())
            ]
        );
        assert!(report.sites.is_empty());
    }

    #[test]
    fn faults_are_parsed_leniently() {
        let fault = parse_fault(
            403,
            r#"{"fault":{"type":"ClientAccessForbiddenException","message":"denied"}}"#,
        );
        assert_eq!(fault.fault_type, "ClientAccessForbiddenException");
        assert_eq!(fault.message, "denied");

        let fault = parse_fault(500, "<html>");
        assert_eq!(fault.status, 500);
        assert!(fault.fault_type.is_empty());
    }
}
