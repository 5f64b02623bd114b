//! Configuration for crm-sync.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::environment::EnvironmentSettings;
use crate::error::{CoreError, CoreResult};

/// Config file read from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "crm-sync.toml";

/// Prefix for environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "CRM_SYNC_";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CrmSyncConfig {
    /// Local filesystem layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// B2C Commerce API behaviour.
    #[serde(default)]
    pub b2c: B2cConfig,

    /// Salesforce API behaviour.
    #[serde(default)]
    pub sf: SfConfig,

    /// Fallback connection values, overridden by `.env` and CLI flags.
    #[serde(default)]
    pub environment: EnvironmentSettings,
}

impl CrmSyncConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `crm-sync.toml` in the current directory (if present)
    /// 3. The explicit file passed via `--config` (must exist)
    /// 4. Environment variables with `CRM_SYNC_` prefix (`__` separates sections)
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut figment = Figment::new().merge(Toml::file(DEFAULT_CONFIG_FILE));

        if let Some(path) = path {
            if !path.exists() {
                return Err(CoreError::config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        tracing::debug!(
            explicit_file = ?path,
            deploy_root = %config.paths.deploy_root.display(),
            ocapi_version = %config.b2c.api_version,
            "configuration loaded"
        );

        Ok(config)
    }
}

/// Local filesystem layout.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root directory receiving deployable archives.
    #[serde(default = "default_deploy_root")]
    pub deploy_root: PathBuf,

    /// Root directory holding the sources that get archived.
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Path scope for B2C Commerce artifacts.
    #[serde(default = "default_b2c_label")]
    pub b2c_label: String,

    /// Path element holding cartridge code.
    #[serde(default = "default_cartridge_path_label")]
    pub cartridge_path_label: String,

    /// Path element holding site-import metadata.
    #[serde(default = "default_metadata_path_label")]
    pub metadata_path_label: String,

    /// Salesforce DX directories.
    #[serde(default)]
    pub dx: DxPathsConfig,

    /// Suffix of the connected-app credential file (prefixed with the instance name).
    #[serde(default = "default_connected_app_file_name")]
    pub connected_app_file_name: String,
}

fn default_deploy_root() -> PathBuf {
    PathBuf::from("build")
}

fn default_source_root() -> PathBuf {
    PathBuf::from("src")
}

fn default_b2c_label() -> String {
    "sfcc".to_owned()
}

fn default_cartridge_path_label() -> String {
    "cartridges".to_owned()
}

fn default_metadata_path_label() -> String {
    "meta".to_owned()
}

fn default_connected_app_file_name() -> String {
    "connectedAppCredentials.json".to_owned()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            deploy_root: default_deploy_root(),
            source_root: default_source_root(),
            b2c_label: default_b2c_label(),
            cartridge_path_label: default_cartridge_path_label(),
            metadata_path_label: default_metadata_path_label(),
            dx: DxPathsConfig::default(),
            connected_app_file_name: default_connected_app_file_name(),
        }
    }
}

/// Salesforce DX project directories.
#[derive(Debug, Clone, Deserialize)]
pub struct DxPathsConfig {
    /// Base of the SFDX source tree.
    #[serde(default = "default_dx_base")]
    pub base: PathBuf,

    /// Package directory below `base` receiving generated metadata.
    #[serde(default = "default_dx_deploy_path")]
    pub deploy_path: PathBuf,

    /// Directory holding metadata templates.
    #[serde(default = "default_dx_templates")]
    pub templates: PathBuf,

    /// Directory receiving audit and credential files.
    #[serde(default = "default_dx_config")]
    pub config: PathBuf,

    /// Metadata file extension appended to generated files.
    #[serde(default = "default_meta_extension")]
    pub meta_extension: String,
}

fn default_dx_base() -> PathBuf {
    PathBuf::from("src/sfdc")
}

fn default_dx_deploy_path() -> PathBuf {
    PathBuf::from("base/main/default")
}

fn default_dx_templates() -> PathBuf {
    PathBuf::from("templates/sfdc")
}

fn default_dx_config() -> PathBuf {
    PathBuf::from("config-dx")
}

fn default_meta_extension() -> String {
    "-meta.xml".to_owned()
}

impl DxPathsConfig {
    /// Directory generated metadata is written to.
    #[must_use]
    pub fn package_dir(&self) -> PathBuf {
        self.base.join(&self.deploy_path)
    }
}

impl Default for DxPathsConfig {
    fn default() -> Self {
        Self {
            base: default_dx_base(),
            deploy_path: default_dx_deploy_path(),
            templates: default_dx_templates(),
            config: default_dx_config(),
            meta_extension: default_meta_extension(),
        }
    }
}

/// B2C Commerce API behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct B2cConfig {
    /// OCAPI Data API version segment (e.g. `v21_3`).
    #[serde(default = "default_ocapi_version")]
    pub api_version: String,

    /// Account Manager host issuing client-credential tokens.
    #[serde(default = "default_account_manager_host")]
    pub account_manager_host: String,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cartridges owned by crm-sync, in cartridge-path order.
    #[serde(default = "default_managed_cartridges")]
    pub managed_cartridges: Vec<String>,

    /// Job executed to import a site archive.
    #[serde(default = "default_site_import_job_id")]
    pub site_import_job_id: String,

    /// Delay between polls of a running import job execution.
    #[serde(default = "default_job_poll_interval_ms")]
    pub job_poll_interval_ms: u64,

    /// Polls before a still-running import counts as failed.
    #[serde(default = "default_job_poll_attempts")]
    pub job_poll_attempts: u32,

    /// Order-on-behalf-of customer settings.
    #[serde(default)]
    pub oobo: OoboConfig,
}

fn default_ocapi_version() -> String {
    "v21_3".to_owned()
}

fn default_account_manager_host() -> String {
    "account.demandware.com".to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

fn default_managed_cartridges() -> Vec<String> {
    vec!["int_b2ccrmsync".to_owned(), "plugin_b2ccrmsync".to_owned()]
}

fn default_site_import_job_id() -> String {
    "sfcc-site-archive-import".to_owned()
}

const fn default_job_poll_interval_ms() -> u64 {
    2_000
}

const fn default_job_poll_attempts() -> u32 {
    150
}

impl Default for B2cConfig {
    fn default() -> Self {
        Self {
            api_version: default_ocapi_version(),
            account_manager_host: default_account_manager_host(),
            request_timeout_secs: default_request_timeout_secs(),
            managed_cartridges: default_managed_cartridges(),
            site_import_job_id: default_site_import_job_id(),
            job_poll_interval_ms: default_job_poll_interval_ms(),
            job_poll_attempts: default_job_poll_attempts(),
            oobo: OoboConfig::default(),
        }
    }
}

/// Order-on-behalf-of customer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OoboConfig {
    /// Prefix of the customer number; the site id is appended.
    #[serde(default = "default_oobo_customer_no_prefix")]
    pub customer_no_prefix: String,

    /// Last name recorded on the synthetic customer.
    #[serde(default = "default_oobo_last_name")]
    pub last_name: String,

    /// Domain used to build the synthetic customer's email and login.
    #[serde(default = "default_oobo_email_domain")]
    pub email_domain: String,

    /// Site preference group receiving the customer number.
    #[serde(default = "default_oobo_preference_group")]
    pub preference_group: String,

    /// Custom preference attribute (without the `c_` prefix).
    #[serde(default = "default_oobo_preference_attribute")]
    pub preference_attribute: String,

    /// Site preference instance type (`sandbox`, `development`, ...).
    #[serde(default = "default_oobo_instance_type")]
    pub instance_type: String,
}

fn default_oobo_customer_no_prefix() -> String {
    "OOBO-".to_owned()
}

fn default_oobo_last_name() -> String {
    "Anonymous OOBO Customer".to_owned()
}

fn default_oobo_email_domain() -> String {
    "oobo.b2ccrmsync.invalid".to_owned()
}

fn default_oobo_preference_group() -> String {
    "B2CCRMSync".to_owned()
}

fn default_oobo_preference_attribute() -> String {
    "b2ccrm_ooboCustomerNo".to_owned()
}

fn default_oobo_instance_type() -> String {
    "sandbox".to_owned()
}

impl Default for OoboConfig {
    fn default() -> Self {
        Self {
            customer_no_prefix: default_oobo_customer_no_prefix(),
            last_name: default_oobo_last_name(),
            email_domain: default_oobo_email_domain(),
            preference_group: default_oobo_preference_group(),
            preference_attribute: default_oobo_preference_attribute(),
            instance_type: default_oobo_instance_type(),
        }
    }
}

/// Salesforce API behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct SfConfig {
    /// API version without the `v` prefix (e.g. `52.0`).
    #[serde(default = "default_sf_api_version")]
    pub api_version: String,

    /// Permission set name embedded in generated connected-app names.
    #[serde(default = "default_sync_permset_name")]
    pub sync_permset_name: String,

    /// Salesforce CLI executable.
    #[serde(default = "default_sf_binary")]
    pub sf_binary: String,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub oobo: SfOoboConfig,
}

fn default_sf_api_version() -> String {
    "52.0".to_owned()
}

fn default_sync_permset_name() -> String {
    "B2CCRMSync".to_owned()
}

fn default_sf_binary() -> String {
    "sf".to_owned()
}

impl Default for SfConfig {
    fn default() -> Self {
        Self {
            api_version: default_sf_api_version(),
            sync_permset_name: default_sync_permset_name(),
            sf_binary: default_sf_binary(),
            request_timeout_secs: default_request_timeout_secs(),
            oobo: SfOoboConfig::default(),
        }
    }
}

/// Where the org keeps B2C customer profiles and storefront records that
/// the OOBO customers are linked to.
#[derive(Debug, Clone, Deserialize)]
pub struct SfOoboConfig {
    /// Object holding synchronised B2C customer profiles.
    #[serde(default = "default_sf_contact_object")]
    pub contact_object: String,

    #[serde(default = "default_sf_customer_no_field")]
    pub customer_no_field: String,

    #[serde(default = "default_sf_customer_list_field")]
    pub customer_list_field: String,

    /// Object describing each B2C storefront.
    #[serde(default = "default_sf_site_object")]
    pub site_object: String,

    /// Field of the storefront record matching the B2C site id.
    #[serde(default = "default_sf_site_id_field")]
    pub site_id_field: String,

    #[serde(default = "default_sf_site_customer_no_field")]
    pub site_customer_no_field: String,

    /// Lookup from the storefront record to the customer profile.
    #[serde(default = "default_sf_site_contact_field")]
    pub site_contact_field: String,
}

fn default_sf_contact_object() -> String {
    "Contact".to_owned()
}

fn default_sf_customer_no_field() -> String {
    "B2C_Customer_No__c".to_owned()
}

fn default_sf_customer_list_field() -> String {
    "B2C_CustomerList_ID__c".to_owned()
}

fn default_sf_site_object() -> String {
    "B2C_Site__c".to_owned()
}

fn default_sf_site_id_field() -> String {
    "Name".to_owned()
}

fn default_sf_site_customer_no_field() -> String {
    "OOBO_Customer_No__c".to_owned()
}

fn default_sf_site_contact_field() -> String {
    "OOBO_Customer_Contact__c".to_owned()
}

impl Default for SfOoboConfig {
    fn default() -> Self {
        Self {
            contact_object: default_sf_contact_object(),
            customer_no_field: default_sf_customer_no_field(),
            customer_list_field: default_sf_customer_list_field(),
            site_object: default_sf_site_object(),
            site_id_field: default_sf_site_id_field(),
            site_customer_no_field: default_sf_site_customer_no_field(),
            site_contact_field: default_sf_site_contact_field(),
        }
    }
}
