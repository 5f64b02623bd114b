//! Command implementations and the state they share.

pub mod b2c;
pub mod env;
pub mod sf;

use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use crm_sync_core::{CrmSyncConfig, EnvironmentDefinition, EnvironmentSettings, SecretValue};

/// Connection properties given as flags or environment variables.
///
/// These take precedence over the `[environment]` table of the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct EnvironmentArgs {
    /// B2C Commerce instance host name
    #[arg(long, env = "B2C_HOSTNAME", global = true)]
    pub b2c_hostname: Option<String>,

    /// Account Manager API client id
    #[arg(long, env = "B2C_CLIENTID", global = true)]
    pub b2c_client_id: Option<String>,

    /// Account Manager API client secret
    #[arg(long, env = "B2C_CLIENTSECRET", global = true, hide_env_values = true)]
    pub b2c_client_secret: Option<String>,

    /// Business Manager user name
    #[arg(long, env = "B2C_USERNAME", global = true)]
    pub b2c_username: Option<String>,

    /// Business Manager access key
    #[arg(long, env = "B2C_ACCESSKEY", global = true, hide_env_values = true)]
    pub b2c_access_key: Option<String>,

    /// Code version to deploy and activate
    #[arg(long, env = "B2C_CODEVERSION", global = true)]
    pub b2c_code_version: Option<String>,

    /// Instance name used in archive and metadata file names
    #[arg(long, env = "B2C_INSTANCENAME", global = true)]
    pub b2c_instance_name: Option<String>,

    /// Comma-separated storefront site ids
    #[arg(long, env = "B2C_SITEIDS", global = true)]
    pub b2c_site_ids: Option<String>,

    /// Salesforce org host name
    #[arg(long, env = "SF_HOSTNAME", global = true)]
    pub sf_hostname: Option<String>,

    /// Salesforce login URL
    #[arg(long, env = "SF_LOGINURL", global = true)]
    pub sf_login_url: Option<String>,

    /// Salesforce user name
    #[arg(long, env = "SF_USERNAME", global = true)]
    pub sf_username: Option<String>,

    /// Salesforce password
    #[arg(long, env = "SF_PASSWORD", global = true, hide_env_values = true)]
    pub sf_password: Option<String>,

    /// Salesforce security token
    #[arg(long, env = "SF_SECURITYTOKEN", global = true, hide_env_values = true)]
    pub sf_security_token: Option<String>,

    /// Scratch org user name used as the deploy target
    #[arg(long, env = "SF_SCRATCHORGUSERNAME", global = true)]
    pub sf_scratch_org_username: Option<String>,

    /// Scratch org definition profile
    #[arg(long, env = "SF_SCRATCHORGPROFILE", global = true)]
    pub sf_scratch_org_profile: Option<String>,

    /// Local alias for the scratch org
    #[arg(long, env = "SF_SCRATCHORGALIAS", global = true)]
    pub sf_scratch_org_alias: Option<String>,

    /// Make the scratch org the default `sf` target (true/false)
    #[arg(long, env = "SF_SCRATCHORGSETDEFAULT", global = true)]
    pub sf_scratch_org_set_default: Option<bool>,

    /// Replace an existing scratch org with the same alias (true/false)
    #[arg(long, env = "SF_SCRATCHORGFORCEOVERWRITE", global = true)]
    pub sf_scratch_org_force_overwrite: Option<bool>,

    /// Scratch org lifetime in days
    #[arg(long, env = "SF_SCRATCHORGDURATIONDAYS", global = true)]
    pub sf_scratch_org_duration_days: Option<u32>,
}

impl EnvironmentArgs {
    pub fn into_settings(self) -> EnvironmentSettings {
        EnvironmentSettings {
            b2c_host_name: self.b2c_hostname,
            b2c_client_id: self.b2c_client_id,
            b2c_client_secret: self.b2c_client_secret.map(SecretValue::from),
            b2c_username: self.b2c_username,
            b2c_access_key: self.b2c_access_key.map(SecretValue::from),
            b2c_code_version: self.b2c_code_version,
            b2c_instance_name: self.b2c_instance_name,
            b2c_site_ids: self.b2c_site_ids,
            sf_host_name: self.sf_hostname,
            sf_login_url: self.sf_login_url,
            sf_username: self.sf_username,
            sf_password: self.sf_password.map(SecretValue::from),
            sf_security_token: self.sf_security_token.map(SecretValue::from),
            sf_scratch_org_username: self.sf_scratch_org_username,
            sf_scratch_org_profile: self.sf_scratch_org_profile,
            sf_scratch_org_alias: self.sf_scratch_org_alias,
            sf_scratch_org_set_default: self.sf_scratch_org_set_default,
            sf_scratch_org_force_overwrite: self.sf_scratch_org_force_overwrite,
            sf_scratch_org_duration_days: self.sf_scratch_org_duration_days,
        }
    }
}

/// Configuration and environment resolved once per invocation.
pub struct Context {
    pub config: CrmSyncConfig,
    pub env: EnvironmentDefinition,
}

impl Context {
    pub fn load(config_path: Option<&Path>, overrides: EnvironmentArgs) -> Result<Self> {
        let mut config =
            CrmSyncConfig::load(config_path).context("failed to load configuration")?;
        let file_settings = std::mem::take(&mut config.environment);
        let env = EnvironmentDefinition::from_settings(overrides.into_settings().merge(file_settings));
        Ok(Self { config, env })
    }
}
