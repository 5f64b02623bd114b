//! Removing crm-sync cartridges from storefront cartridge paths.

use std::fmt;

use tracing::{info, warn};

use crate::api::{AuthToken, OcapiClient};
use crate::sites::SiteRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    /// The cartridge was not on the site's path.
    NotPresent,
    Failed(String),
}

impl fmt::Display for RemovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => f.write_str("removed"),
            Self::NotPresent => f.write_str("not present"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeRemoval {
    pub site_id: String,
    pub cartridge: String,
    pub outcome: RemovalOutcome,
}

/// Remove every cartridge from every site; each pair is reported.
pub async fn remove_cartridges(
    client: &OcapiClient,
    token: &AuthToken,
    sites: &[SiteRecord],
    cartridges: &[String],
) -> Vec<CartridgeRemoval> {
    let mut results = Vec::with_capacity(sites.len() * cartridges.len());

    for site in sites {
        for cartridge in cartridges {
            let outcome = match client.remove_cartridge(token, &site.id, cartridge).await {
                Ok(true) => RemovalOutcome::Removed,
                Ok(false) => RemovalOutcome::NotPresent,
                Err(err) => {
                    warn!(site_id = %site.id, cartridge = %cartridge, error = %err, "cartridge removal failed");
                    RemovalOutcome::Failed(err.to_string())
                }
            };
            info!(site_id = %site.id, cartridge = %cartridge, outcome = %outcome, "cartridge path updated");
            results.push(CartridgeRemoval {
                site_id: site.id.clone(),
                cartridge: cartridge.clone(),
                outcome,
            });
        }
    }

    results
}
