//! Storefront site verification.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::{AuthToken, OcapiClient};

/// The parts of an OCAPI site document crm-sync reads.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteRecord {
    pub id: String,
    /// Localised display names keyed by locale (`default`, `en_US`, ...).
    #[serde(default)]
    pub display_name: HashMap<String, String>,
    #[serde(default)]
    pub storefront_status: Option<String>,
    /// Colon-separated cartridge path.
    #[serde(default)]
    pub cartridges: Option<String>,
    #[serde(default)]
    pub customer_list_link: Option<CustomerListLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerListLink {
    pub customer_list_id: String,
}

impl SiteRecord {
    /// Default display name, falling back to the id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .get("default")
            .map_or(self.id.as_str(), String::as_str)
    }

    /// Customer list backing the site; sites without a link share their id with it.
    #[must_use]
    pub fn customer_list_id(&self) -> &str {
        self.customer_list_link
            .as_ref()
            .map_or(self.id.as_str(), |link| link.customer_list_id.as_str())
    }
}

/// A site that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFailure {
    pub site_id: String,
    /// HTTP status when the instance answered.
    pub status: Option<u16>,
    pub message: String,
}

/// Outcome of verifying every configured site.
#[derive(Debug, Clone, Default)]
pub struct SiteVerification {
    pub verified: Vec<SiteRecord>,
    pub failed: Vec<SiteFailure>,
}

impl SiteVerification {
    #[must_use]
    pub fn all_verified(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetch each site in turn; failures are collected, not propagated.
pub async fn verify_sites(
    client: &OcapiClient,
    token: &AuthToken,
    site_ids: &[String],
) -> SiteVerification {
    let mut outcome = SiteVerification::default();

    for site_id in site_ids {
        match client.get_site(token, site_id).await {
            Ok(site) => {
                debug!(site_id = %site_id, "site verified");
                outcome.verified.push(site);
            }
            Err(err) => {
                warn!(site_id = %site_id, error = %err, "site verification failed");
                outcome.failed.push(SiteFailure {
                    site_id: site_id.clone(),
                    status: err.upstream().map(|(status, _)| status),
                    message: err.to_string(),
                });
            }
        }
    }

    outcome
}
