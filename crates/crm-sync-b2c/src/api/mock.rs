use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use crm_sync_core::ArtifactScope;
use serde_json::{json, Value};

use super::{ActivationReceipt, AuthToken, CommerceApi, Credentials, DeployReceipt, DeployRequest};
use crate::error::{B2cError, B2cResult};

/// Scripted [`CommerceApi`] for testing.
///
/// Every call is counted, including failing ones.
#[derive(Debug)]
pub struct MockCommerceApi {
    token: String,
    deploy_version: Option<String>,
    versions: Vec<Value>,
    fail_authentication: bool,
    fail_deploy: bool,
    fail_activation: bool,
    fail_verification: bool,
    authenticate_calls: AtomicUsize,
    deploy_calls: AtomicUsize,
    activate_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl Default for MockCommerceApi {
    fn default() -> Self {
        Self::new("mock-token", Some("version1"), Vec::new())
    }
}

impl MockCommerceApi {
    /// A mock whose calls all succeed.
    #[must_use]
    pub fn new(token: &str, deploy_version: Option<&str>, versions: Vec<Value>) -> Self {
        Self {
            token: token.to_owned(),
            deploy_version: deploy_version.map(str::to_owned),
            versions,
            fail_authentication: false,
            fail_deploy: false,
            fail_activation: false,
            fail_verification: false,
            authenticate_calls: AtomicUsize::new(0),
            deploy_calls: AtomicUsize::new(0),
            activate_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing_authentication(mut self) -> Self {
        self.fail_authentication = true;
        self
    }

    #[must_use]
    pub fn failing_deploy(mut self) -> Self {
        self.fail_deploy = true;
        self
    }

    #[must_use]
    pub fn failing_activation(mut self) -> Self {
        self.fail_activation = true;
        self
    }

    #[must_use]
    pub fn failing_verification(mut self) -> Self {
        self.fail_verification = true;
        self
    }

    pub fn authenticate_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    pub fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    pub fn activate_calls(&self) -> usize {
        self.activate_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Total calls across every endpoint.
    pub fn total_calls(&self) -> usize {
        self.authenticate_calls() + self.deploy_calls() + self.activate_calls() + self.fetch_calls()
    }
}

fn scripted_failure(status: u16, body: &str) -> B2cError {
    B2cError::Status {
        status,
        body: body.to_owned(),
    }
}

#[async_trait]
impl CommerceApi for MockCommerceApi {
    async fn authenticate(&self, _credentials: &Credentials) -> B2cResult<AuthToken> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_authentication {
            return Err(scripted_failure(401, "{\"error\":\"invalid_client\"}"));
        }
        Ok(AuthToken::new(self.token.clone()))
    }

    async fn deploy(&self, _token: &AuthToken, request: &DeployRequest) -> B2cResult<DeployReceipt> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deploy {
            return Err(scripted_failure(500, "webdav upload rejected"));
        }
        Ok(DeployReceipt {
            version: self.deploy_version.clone(),
            location: format!("mock://{}", request.archive.archive_name),
        })
    }

    async fn activate(
        &self,
        _token: &AuthToken,
        _scope: ArtifactScope,
        version: &str,
    ) -> B2cResult<ActivationReceipt> {
        self.activate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_activation {
            return Err(scripted_failure(400, "{\"fault\":{\"type\":\"CodeVersionActivationException\"}}"));
        }
        Ok(ActivationReceipt {
            id: version.to_owned(),
            raw: json!({ "id": version, "active": true }),
        })
    }

    async fn fetch_versions(
        &self,
        _token: &AuthToken,
        _scope: ArtifactScope,
        _id: &str,
    ) -> B2cResult<Vec<Value>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_verification {
            return Err(scripted_failure(503, "service unavailable"));
        }
        Ok(self.versions.clone())
    }
}
