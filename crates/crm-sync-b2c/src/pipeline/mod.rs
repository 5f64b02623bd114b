//! Deployment pipeline: locate, authenticate, deploy, activate, verify.
//!
//! Stages run strictly in sequence and the first failure ends the run.
//! Remote side effects of earlier stages are left in place; an uploaded
//! but not activated archive stays on the instance.

mod result;
mod stages;
mod state;

pub use result::{
    Activated, Authenticated, BuildStage, Deployed, DeploymentResult, DeploymentResultBuilder,
    Located, OutputDisplay, Verified,
};
pub use stages::{Activator, Authenticator, Deployer, Verifier};
pub use state::{PipelineState, Stage};

use std::sync::Arc;

use crm_sync_core::{ArtifactScope, EnvironmentDefinition, PathsConfig};
use tracing::{debug, error, info};

use crate::api::CommerceApi;
use crate::archive;
use crate::error::StageError;

/// Runs deployments against one [`CommerceApi`].
pub struct Pipeline {
    api: Arc<dyn CommerceApi>,
    paths: PathsConfig,
}

impl Pipeline {
    pub fn new(api: Arc<dyn CommerceApi>, paths: PathsConfig) -> Self {
        Self { api, paths }
    }

    /// Deploy the archive for `scope` and return the verified result.
    pub async fn run(
        &self,
        env: &EnvironmentDefinition,
        scope: ArtifactScope,
    ) -> Result<DeploymentResult, StageError> {
        let mut state = PipelineState::Idle;

        info!(
            scope = %scope,
            instance = env.b2c.instance_name.as_deref().unwrap_or_default(),
            "starting deployment pipeline"
        );

        match self.execute(env, scope, &mut state).await {
            Ok(result) => {
                advance(&mut state);
                info!(
                    scope = %scope,
                    version = %result.summary().id,
                    active = result.summary().active,
                    "deployment pipeline completed"
                );
                Ok(result)
            }
            Err(err) => {
                state = state.fail();
                error!(state = %state, error = %err, "deployment pipeline failed");
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        env: &EnvironmentDefinition,
        scope: ArtifactScope,
        state: &mut PipelineState,
    ) -> Result<DeploymentResult, StageError> {
        let api = self.api.as_ref();

        advance(state);
        let archive = archive::locate(&self.paths, &env.b2c, scope)?;
        let builder = DeploymentResultBuilder::located(archive.clone());

        advance(state);
        let token = Authenticator::new(api).authenticate(&env.b2c).await?;
        let builder = builder.authenticated(&token);

        advance(state);
        let receipt = Deployer::new(api).deploy(&token, &archive, &env.b2c).await?;
        let builder = builder.deployed(receipt);

        advance(state);
        let activation = Activator::new(api)
            .activate(&token, scope, builder.receipt())
            .await?;
        let builder = builder.activated(activation);

        advance(state);
        let (raw, summary) = Verifier::new(api)
            .verify(&token, scope, builder.activation_id())
            .await?;

        Ok(builder.verified(raw, summary).build())
    }
}

fn advance(state: &mut PipelineState) {
    if let Some(next) = state.next() {
        debug!(from = %state, to = %next, "pipeline transition");
        *state = next;
    }
}
