//! Typestate accumulator for a pipeline run.
//!
//! Each completed stage moves the builder into the next marker type, so a
//! [`DeploymentResult`] can only be built once every stage has succeeded.
//!
//! ```ignore
//! let builder = DeploymentResultBuilder::located(archive);
//! let builder = builder.authenticated(&token).deployed(receipt);
//! // builder.build() would not compile - not yet activated and verified
//! ```

use crm_sync_core::ArtifactScope;
use serde_json::Value;

use crate::api::{ActivationReceipt, AuthToken, DeployReceipt};
use crate::archive::ArtifactReference;
use crate::version::VersionSummary;

/// Marker trait for builder stages.
pub trait BuildStage: private::Sealed {
    /// Stage name for logs.
    fn name() -> &'static str;
}

mod private {
    pub trait Sealed {}
}

/// The archive exists on disk.
#[derive(Debug)]
pub struct Located {
    archive: ArtifactReference,
}

/// A token was issued.
#[derive(Debug)]
pub struct Authenticated {
    archive: ArtifactReference,
    token_preview: String,
}

/// The archive was uploaded.
#[derive(Debug)]
pub struct Deployed {
    archive: ArtifactReference,
    token_preview: String,
    deploy: DeployReceipt,
}

/// The uploaded version is live.
#[derive(Debug)]
pub struct Activated {
    archive: ArtifactReference,
    token_preview: String,
    deploy: DeployReceipt,
    activation: ActivationReceipt,
}

/// The live version was read back.
#[derive(Debug)]
pub struct Verified {
    archive: ArtifactReference,
    token_preview: String,
    deploy: DeployReceipt,
    activation: ActivationReceipt,
    verify_raw: Value,
    summary: VersionSummary,
}

impl private::Sealed for Located {}
impl private::Sealed for Authenticated {}
impl private::Sealed for Deployed {}
impl private::Sealed for Activated {}
impl private::Sealed for Verified {}

impl BuildStage for Located {
    fn name() -> &'static str {
        "located"
    }
}

impl BuildStage for Authenticated {
    fn name() -> &'static str {
        "authenticated"
    }
}

impl BuildStage for Deployed {
    fn name() -> &'static str {
        "deployed"
    }
}

impl BuildStage for Activated {
    fn name() -> &'static str {
        "activated"
    }
}

impl BuildStage for Verified {
    fn name() -> &'static str {
        "verified"
    }
}

/// Accumulates stage outputs for one run.
#[derive(Debug)]
pub struct DeploymentResultBuilder<S: BuildStage> {
    stage: S,
}

impl<S: BuildStage> DeploymentResultBuilder<S> {
    #[must_use]
    pub fn stage_name(&self) -> &'static str {
        S::name()
    }
}

impl DeploymentResultBuilder<Located> {
    #[must_use]
    pub const fn located(archive: ArtifactReference) -> Self {
        Self {
            stage: Located { archive },
        }
    }

    /// Only a masked preview of the token is kept.
    #[must_use]
    pub fn authenticated(self, token: &AuthToken) -> DeploymentResultBuilder<Authenticated> {
        DeploymentResultBuilder {
            stage: Authenticated {
                archive: self.stage.archive,
                token_preview: token.preview(),
            },
        }
    }
}

impl DeploymentResultBuilder<Authenticated> {
    #[must_use]
    pub fn deployed(self, deploy: DeployReceipt) -> DeploymentResultBuilder<Deployed> {
        let Authenticated {
            archive,
            token_preview,
        } = self.stage;
        DeploymentResultBuilder {
            stage: Deployed {
                archive,
                token_preview,
                deploy,
            },
        }
    }
}

impl DeploymentResultBuilder<Deployed> {
    /// The receipt handed to the activator.
    #[must_use]
    pub const fn receipt(&self) -> &DeployReceipt {
        &self.stage.deploy
    }

    #[must_use]
    pub fn activated(self, activation: ActivationReceipt) -> DeploymentResultBuilder<Activated> {
        let Deployed {
            archive,
            token_preview,
            deploy,
        } = self.stage;
        DeploymentResultBuilder {
            stage: Activated {
                archive,
                token_preview,
                deploy,
                activation,
            },
        }
    }
}

impl DeploymentResultBuilder<Activated> {
    /// Identifier the verifier looks up.
    #[must_use]
    pub fn activation_id(&self) -> &str {
        &self.stage.activation.id
    }

    #[must_use]
    pub fn verified(
        self,
        verify_raw: Value,
        summary: VersionSummary,
    ) -> DeploymentResultBuilder<Verified> {
        let Activated {
            archive,
            token_preview,
            deploy,
            activation,
        } = self.stage;
        DeploymentResultBuilder {
            stage: Verified {
                archive,
                token_preview,
                deploy,
                activation,
                verify_raw,
                summary,
            },
        }
    }
}

impl DeploymentResultBuilder<Verified> {
    #[must_use]
    pub fn build(self) -> DeploymentResult {
        let Verified {
            archive,
            token_preview,
            deploy,
            activation,
            verify_raw,
            summary,
        } = self.stage;
        DeploymentResult {
            archive,
            token_preview,
            deploy,
            activation,
            verify_raw,
            summary,
        }
    }
}

/// Everything a successful run produced. Immutable once built.
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    archive: ArtifactReference,
    token_preview: String,
    deploy: DeployReceipt,
    activation: ActivationReceipt,
    verify_raw: Value,
    summary: VersionSummary,
}

/// The human-facing part of a [`DeploymentResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDisplay {
    pub auth_token: String,
    pub version: VersionSummary,
}

impl DeploymentResult {
    #[must_use]
    pub const fn scope(&self) -> ArtifactScope {
        self.archive.scope
    }

    #[must_use]
    pub const fn archive(&self) -> &ArtifactReference {
        &self.archive
    }

    #[must_use]
    pub fn token_preview(&self) -> &str {
        &self.token_preview
    }

    #[must_use]
    pub const fn deploy(&self) -> &DeployReceipt {
        &self.deploy
    }

    #[must_use]
    pub const fn activation(&self) -> &ActivationReceipt {
        &self.activation
    }

    /// The raw record the summary was projected from.
    #[must_use]
    pub const fn verify_raw(&self) -> &Value {
        &self.verify_raw
    }

    #[must_use]
    pub const fn summary(&self) -> &VersionSummary {
        &self.summary
    }

    #[must_use]
    pub fn output_display(&self) -> OutputDisplay {
        OutputDisplay {
            auth_token: self.token_preview.clone(),
            version: self.summary.clone(),
        }
    }
}
