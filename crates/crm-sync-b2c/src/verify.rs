//! Environment verification: credentials, storefront sites and code version.

use crm_sync_core::{EnvironmentDefinition, Requirement};
use tracing::info;

use crate::api::{AuthToken, CommerceApi, Credentials, OcapiClient};
use crate::error::B2cResult;
use crate::sites::{self, SiteVerification};
use crate::version::{self, VersionSummary};

/// Outcome of `b2c verify`.
#[derive(Debug, Clone)]
pub struct EnvironmentVerification {
    pub token_preview: String,
    pub sites: SiteVerification,
    /// The configured code version, `None` when the instance does not have it.
    pub code_version: Option<VersionSummary>,
}

impl EnvironmentVerification {
    /// Every site resolved and the code version exists.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.sites.all_verified() && self.code_version.is_some()
    }
}

/// Authenticate with client credentials after checking the connection properties.
pub async fn authenticate(client: &OcapiClient, env: &EnvironmentDefinition) -> B2cResult<AuthToken> {
    env.validate(&[Requirement::B2cConnection])?;
    let credentials = Credentials::client(&env.b2c)?;
    client.authenticate(&credentials).await
}

/// Authenticate and verify the configured sites.
pub async fn verify_sites(
    client: &OcapiClient,
    env: &EnvironmentDefinition,
) -> B2cResult<(AuthToken, SiteVerification)> {
    env.validate(&[Requirement::B2cConnection, Requirement::B2cSiteIds])?;
    let token = authenticate(client, env).await?;
    let sites = sites::verify_sites(client, &token, &env.b2c.site_ids).await;
    Ok((token, sites))
}

/// Verify credentials, every configured site and the configured code version.
///
/// Missing connection properties fail before any request.
pub async fn verify_environment(
    client: &OcapiClient,
    env: &EnvironmentDefinition,
) -> B2cResult<EnvironmentVerification> {
    env.validate(&[
        Requirement::B2cConnection,
        Requirement::B2cCodeVersion,
        Requirement::B2cSiteIds,
    ])?;
    let code_version = env.b2c.code_version()?;

    let (token, sites) = verify_sites(client, env).await?;
    let records = client.code_versions(&token).await?;
    let code_version = version::find_version(&records, code_version)
        .ok()
        .map(|(_, summary)| summary);

    info!(
        verified_sites = sites.verified.len(),
        failed_sites = sites.failed.len(),
        code_version_found = code_version.is_some(),
        "environment verified"
    );

    Ok(EnvironmentVerification {
        token_preview: token.preview(),
        sites,
        code_version,
    })
}

/// List every code version on the instance.
pub async fn list_code_versions(
    client: &OcapiClient,
    env: &EnvironmentDefinition,
) -> B2cResult<Vec<VersionSummary>> {
    let token = authenticate(client, env).await?;
    let records = client.code_versions(&token).await?;
    Ok(VersionSummary::project_all(&records))
}
