//! Transport seam between the deployment pipeline and B2C Commerce.
//!
//! [`CommerceApi`] covers the four remote calls the pipeline makes. The
//! production implementation is [`OcapiClient`]; [`MockCommerceApi`] records
//! call counts for tests.

mod mock;
mod ocapi;

pub use mock::MockCommerceApi;
pub use ocapi::OcapiClient;

use async_trait::async_trait;
use crm_sync_core::{ArtifactScope, B2cConnection, CoreResult, SecretValue};
use serde::Deserialize;

use crate::archive::ArtifactReference;
use crate::error::B2cResult;

/// Bearer token returned by an OAuth token endpoint.
///
/// Scoped to a single invocation; never cached or persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub access_token: SecretValue,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds, as reported by the issuer.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl AuthToken {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretValue::new(access_token),
            token_type: Some("Bearer".to_owned()),
            expires_in: None,
        }
    }

    /// Raw token for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> &str {
        self.access_token.expose()
    }

    /// Masked form for tables and logs.
    #[must_use]
    pub fn preview(&self) -> String {
        self.access_token.preview()
    }
}

/// Credentials for one of the two supported grant types.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Account Manager client-credentials grant.
    Client {
        client_id: String,
        client_secret: SecretValue,
    },
    /// Business Manager user grant issued by the instance itself.
    BusinessManager {
        client_id: String,
        client_secret: SecretValue,
        username: String,
        access_key: SecretValue,
    },
}

impl Credentials {
    /// Client-credentials grant from the connection's API client.
    pub fn client(connection: &B2cConnection) -> CoreResult<Self> {
        Ok(Self::Client {
            client_id: connection.client_id()?.to_owned(),
            client_secret: connection.client_secret()?.clone(),
        })
    }

    /// Business Manager user grant; needs the BM user name and access key as well.
    pub fn business_manager(connection: &B2cConnection) -> CoreResult<Self> {
        Ok(Self::BusinessManager {
            client_id: connection.client_id()?.to_owned(),
            client_secret: connection.client_secret()?.clone(),
            username: connection.username()?.to_owned(),
            access_key: connection.access_key()?.clone(),
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        match self {
            Self::Client { client_id, .. } | Self::BusinessManager { client_id, .. } => client_id,
        }
    }
}

/// What to upload.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub archive: ArtifactReference,
    /// Code version the archive unpacks into; only set for code archives.
    pub code_version: Option<String>,
}

/// Result of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    /// Identifier the activator works with: the code version for code
    /// archives, the uploaded file name for data archives.
    pub version: Option<String>,
    /// Remote location the archive was written to.
    pub location: String,
}

/// Result of an activation.
#[derive(Debug, Clone)]
pub struct ActivationReceipt {
    /// Identifier to verify: the code version, or the import job execution id.
    pub id: String,
    /// Raw activation response.
    pub raw: serde_json::Value,
}

/// Remote calls made by the deployment pipeline.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn authenticate(&self, credentials: &Credentials) -> B2cResult<AuthToken>;

    /// Upload an archive.
    async fn deploy(&self, token: &AuthToken, request: &DeployRequest) -> B2cResult<DeployReceipt>;

    /// Make an uploaded version live.
    async fn activate(
        &self,
        token: &AuthToken,
        scope: ArtifactScope,
        version: &str,
    ) -> B2cResult<ActivationReceipt>;

    /// Fetch the raw version records the activated identifier should appear in.
    async fn fetch_versions(
        &self,
        token: &AuthToken,
        scope: ArtifactScope,
        id: &str,
    ) -> B2cResult<Vec<serde_json::Value>>;
}
