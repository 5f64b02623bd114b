//! The `B2CInstanceSetup` Flow, which registers a B2C instance in the org.

use crm_sync_core::{EnvironmentDefinition, Requirement};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{SalesforceClient, SfSession};
use crate::error::SfdcResult;

pub const INSTANCE_SETUP_FLOW: &str = "B2CInstanceSetup";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowActionResult {
    #[serde(default)]
    is_success: bool,
    #[serde(default)]
    errors: Option<Vec<FlowActionError>>,
    #[serde(default)]
    output_values: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct FlowActionError {
    #[serde(default)]
    message: String,
}

/// Outcome of a Flow invocation.
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub is_success: bool,
    pub errors: Vec<String>,
    pub output_values: Vec<Value>,
}

/// Log in with the configured user and run the instance setup Flow against
/// the org host.
pub async fn run_instance_setup(
    client: &SalesforceClient,
    env: &EnvironmentDefinition,
) -> SfdcResult<FlowOutcome> {
    env.validate(&[
        Requirement::SfLogin,
        Requirement::SfHost,
        Requirement::B2cInstanceName,
    ])?;

    let sf = &env.sf;
    let session = client
        .login(
            sf.login_url()?,
            sf.username()?,
            sf.password()?,
            sf.security_token()?,
        )
        .await?;

    let instance_url = format!("https://{}", sf.host()?);
    instance_setup(client, &instance_url, &session, env.b2c.instance_name()?).await
}

/// Run the instance setup Flow for `instance_name`.
pub async fn instance_setup(
    client: &SalesforceClient,
    instance_url: &str,
    session: &SfSession,
    instance_name: &str,
) -> SfdcResult<FlowOutcome> {
    let inputs = json!([{
        "instanceName": instance_name,
        "BypassAuthTokenAuditing": true
    }]);

    let raw = client
        .run_flow(instance_url, session, INSTANCE_SETUP_FLOW, inputs)
        .await?;
    let results: Vec<FlowActionResult> = serde_json::from_value(raw)?;

    let outcome = FlowOutcome {
        is_success: !results.is_empty() && results.iter().all(|r| r.is_success),
        errors: results
            .iter()
            .flat_map(|r| r.errors.iter().flatten())
            .map(|e| e.message.clone())
            .collect(),
        output_values: results
            .into_iter()
            .filter_map(|r| r.output_values)
            .collect(),
    };

    info!(
        instance = instance_name,
        success = outcome.is_success,
        "instance setup flow finished"
    );
    Ok(outcome)
}
