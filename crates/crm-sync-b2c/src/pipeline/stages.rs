//! The four remote stages of the deployment pipeline.

use crm_sync_core::{ArtifactScope, B2cConnection};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{
    ActivationReceipt, AuthToken, CommerceApi, Credentials, DeployReceipt, DeployRequest,
};
use crate::archive::ArtifactReference;
use crate::error::{B2cError, StageError};
use crate::version::{self, VersionSummary};

/// Exchanges client credentials for a bearer token.
pub struct Authenticator<'a> {
    api: &'a dyn CommerceApi,
}

impl<'a> Authenticator<'a> {
    pub const fn new(api: &'a dyn CommerceApi) -> Self {
        Self { api }
    }

    /// Missing credentials fail before any request is sent.
    pub async fn authenticate(&self, connection: &B2cConnection) -> Result<AuthToken, StageError> {
        let credentials = Credentials::client(connection)
            .map_err(|e| StageError::Authentication(B2cError::Environment(e)))?;

        let token = self
            .api
            .authenticate(&credentials)
            .await
            .map_err(StageError::Authentication)?;

        debug!(token = %token.preview(), "authenticated");
        Ok(token)
    }
}

/// Uploads an archive.
pub struct Deployer<'a> {
    api: &'a dyn CommerceApi,
}

impl<'a> Deployer<'a> {
    pub const fn new(api: &'a dyn CommerceApi) -> Self {
        Self { api }
    }

    /// Code archives need the connection's code version, checked before upload.
    pub async fn deploy(
        &self,
        token: &AuthToken,
        archive: &ArtifactReference,
        connection: &B2cConnection,
    ) -> Result<DeployReceipt, StageError> {
        let code_version = match archive.scope {
            ArtifactScope::Code => Some(
                connection
                    .code_version()
                    .map_err(|e| StageError::DeploymentTransport(B2cError::Environment(e)))?
                    .to_owned(),
            ),
            ArtifactScope::Data => None,
        };

        let request = DeployRequest {
            archive: archive.clone(),
            code_version,
        };

        self.api
            .deploy(token, &request)
            .await
            .map_err(StageError::DeploymentTransport)
    }
}

/// Makes a deployed version live.
pub struct Activator<'a> {
    api: &'a dyn CommerceApi,
}

impl<'a> Activator<'a> {
    pub const fn new(api: &'a dyn CommerceApi) -> Self {
        Self { api }
    }

    /// Refuses receipts without a usable version identifier.
    pub async fn activate(
        &self,
        token: &AuthToken,
        scope: ArtifactScope,
        receipt: &DeployReceipt,
    ) -> Result<ActivationReceipt, StageError> {
        let version = receipt
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(StageError::Activation(B2cError::MissingVersion))?;

        self.api
            .activate(token, scope, version)
            .await
            .map_err(StageError::Activation)
    }
}

/// Reads back the activated version.
pub struct Verifier<'a> {
    api: &'a dyn CommerceApi,
}

impl<'a> Verifier<'a> {
    pub const fn new(api: &'a dyn CommerceApi) -> Self {
        Self { api }
    }

    /// Returns the matching raw record and its projection.
    ///
    /// A record the remote does not report as active fails verification.
    pub async fn verify(
        &self,
        token: &AuthToken,
        scope: ArtifactScope,
        id: &str,
    ) -> Result<(Value, VersionSummary), StageError> {
        let records = self
            .api
            .fetch_versions(token, scope, id)
            .await
            .map_err(StageError::Verification)?;

        let (raw, summary) =
            version::find_version(&records, id).map_err(StageError::Verification)?;
        if !summary.active {
            warn!(id, ?raw, "version is not active after activation");
            return Err(StageError::Verification(B2cError::Inactive(id.to_owned())));
        }
        Ok((raw, summary))
    }
}
