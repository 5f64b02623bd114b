//! Connection parameters for the B2C Commerce instance and Salesforce org.
//!
//! Values arrive from three places: CLI flags (which clap also fills from
//! the process environment and `.env`), and the `[environment]` table of the
//! config file. [`EnvironmentSettings::merge`] layers them and
//! [`EnvironmentDefinition::from_settings`] freezes the result for one
//! invocation.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::secret::SecretValue;

/// Raw, possibly incomplete connection values from a single source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub b2c_host_name: Option<String>,
    pub b2c_client_id: Option<String>,
    pub b2c_client_secret: Option<SecretValue>,
    pub b2c_username: Option<String>,
    pub b2c_access_key: Option<SecretValue>,
    pub b2c_code_version: Option<String>,
    pub b2c_instance_name: Option<String>,
    /// Comma-separated list of storefront site ids.
    pub b2c_site_ids: Option<String>,
    pub sf_host_name: Option<String>,
    pub sf_login_url: Option<String>,
    pub sf_username: Option<String>,
    pub sf_password: Option<SecretValue>,
    pub sf_security_token: Option<SecretValue>,
    pub sf_scratch_org_username: Option<String>,
    pub sf_scratch_org_profile: Option<String>,
    pub sf_scratch_org_alias: Option<String>,
    pub sf_scratch_org_set_default: Option<bool>,
    pub sf_scratch_org_force_overwrite: Option<bool>,
    pub sf_scratch_org_duration_days: Option<u32>,
}

impl EnvironmentSettings {
    /// Fill every unset value in `self` from `fallback`.
    #[must_use]
    pub fn merge(self, fallback: Self) -> Self {
        Self {
            b2c_host_name: self.b2c_host_name.or(fallback.b2c_host_name),
            b2c_client_id: self.b2c_client_id.or(fallback.b2c_client_id),
            b2c_client_secret: self.b2c_client_secret.or(fallback.b2c_client_secret),
            b2c_username: self.b2c_username.or(fallback.b2c_username),
            b2c_access_key: self.b2c_access_key.or(fallback.b2c_access_key),
            b2c_code_version: self.b2c_code_version.or(fallback.b2c_code_version),
            b2c_instance_name: self.b2c_instance_name.or(fallback.b2c_instance_name),
            b2c_site_ids: self.b2c_site_ids.or(fallback.b2c_site_ids),
            sf_host_name: self.sf_host_name.or(fallback.sf_host_name),
            sf_login_url: self.sf_login_url.or(fallback.sf_login_url),
            sf_username: self.sf_username.or(fallback.sf_username),
            sf_password: self.sf_password.or(fallback.sf_password),
            sf_security_token: self.sf_security_token.or(fallback.sf_security_token),
            sf_scratch_org_username: self
                .sf_scratch_org_username
                .or(fallback.sf_scratch_org_username),
            sf_scratch_org_profile: self.sf_scratch_org_profile.or(fallback.sf_scratch_org_profile),
            sf_scratch_org_alias: self.sf_scratch_org_alias.or(fallback.sf_scratch_org_alias),
            sf_scratch_org_set_default: self
                .sf_scratch_org_set_default
                .or(fallback.sf_scratch_org_set_default),
            sf_scratch_org_force_overwrite: self
                .sf_scratch_org_force_overwrite
                .or(fallback.sf_scratch_org_force_overwrite),
            sf_scratch_org_duration_days: self
                .sf_scratch_org_duration_days
                .or(fallback.sf_scratch_org_duration_days),
        }
    }
}

/// B2C Commerce instance connection.
#[derive(Debug, Clone, Default)]
pub struct B2cConnection {
    pub host_name: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretValue>,
    pub username: Option<String>,
    pub access_key: Option<SecretValue>,
    pub code_version: Option<String>,
    pub instance_name: Option<String>,
    pub site_ids: Vec<String>,
}

impl B2cConnection {
    /// Instance host name.
    pub fn host(&self) -> CoreResult<&str> {
        required(self.host_name.as_deref(), Requirement::B2C_HOSTNAME)
    }

    /// API client id.
    pub fn client_id(&self) -> CoreResult<&str> {
        required(self.client_id.as_deref(), Requirement::B2C_CLIENTID)
    }

    /// API client secret.
    pub fn client_secret(&self) -> CoreResult<&SecretValue> {
        required_secret(self.client_secret.as_ref(), Requirement::B2C_CLIENTSECRET)
    }

    /// Business Manager user name.
    pub fn username(&self) -> CoreResult<&str> {
        required(self.username.as_deref(), Requirement::B2C_USERNAME)
    }

    /// Business Manager access key.
    pub fn access_key(&self) -> CoreResult<&SecretValue> {
        required_secret(self.access_key.as_ref(), Requirement::B2C_ACCESSKEY)
    }

    /// Code version deployed to and activated on the instance.
    pub fn code_version(&self) -> CoreResult<&str> {
        required(self.code_version.as_deref(), Requirement::B2C_CODEVERSION)
    }

    /// Instance name used in archive and metadata file names.
    pub fn instance_name(&self) -> CoreResult<&str> {
        required(self.instance_name.as_deref(), Requirement::B2C_INSTANCENAME)
    }
}

/// Salesforce org connection.
#[derive(Debug, Clone, Default)]
pub struct SfConnection {
    pub host_name: Option<String>,
    pub login_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretValue>,
    pub security_token: Option<SecretValue>,
    pub scratch_org_username: Option<String>,
    pub scratch_org: ScratchOrgOptions,
}

/// How a scratch org is created: definition profile, local alias and
/// lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScratchOrgOptions {
    pub profile: Option<String>,
    pub alias: Option<String>,
    /// Make the new org the default target of the `sf` CLI.
    pub set_default: bool,
    /// Replace an existing org with the same alias.
    pub force_overwrite: bool,
    pub duration_days: Option<u32>,
}

impl SfConnection {
    /// Org instance host name.
    pub fn host(&self) -> CoreResult<&str> {
        required(self.host_name.as_deref(), Requirement::SF_HOSTNAME)
    }

    /// Login endpoint (e.g. `https://test.salesforce.com`).
    pub fn login_url(&self) -> CoreResult<&str> {
        required(self.login_url.as_deref(), Requirement::SF_LOGINURL)
    }

    /// Integration user name.
    pub fn username(&self) -> CoreResult<&str> {
        required(self.username.as_deref(), Requirement::SF_USERNAME)
    }

    /// Integration user password.
    pub fn password(&self) -> CoreResult<&SecretValue> {
        required_secret(self.password.as_ref(), Requirement::SF_PASSWORD)
    }

    /// Integration user security token.
    pub fn security_token(&self) -> CoreResult<&SecretValue> {
        required_secret(self.security_token.as_ref(), Requirement::SF_SECURITYTOKEN)
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> CoreResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CoreError::InvalidEnvironment {
            missing: vec![name],
        }),
    }
}

fn required_secret<'a>(
    value: Option<&'a SecretValue>,
    name: &'static str,
) -> CoreResult<&'a SecretValue> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CoreError::InvalidEnvironment {
            missing: vec![name],
        }),
    }
}

/// The resolved, read-only environment for one invocation.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentDefinition {
    pub b2c: B2cConnection,
    pub sf: SfConnection,
}

impl EnvironmentDefinition {
    /// Freeze merged settings into a definition.
    ///
    /// Site ids are split on commas with blanks dropped. When no instance
    /// name is configured it defaults to the first label of the B2C host
    /// name (`zzzz-001` for `zzzz-001.sandbox.us01.dx.commercecloud.salesforce.com`).
    #[must_use]
    pub fn from_settings(settings: EnvironmentSettings) -> Self {
        let site_ids = settings
            .b2c_site_ids
            .as_deref()
            .map(split_site_ids)
            .unwrap_or_default();

        let instance_name = non_blank(settings.b2c_instance_name).or_else(|| {
            settings
                .b2c_host_name
                .as_deref()
                .and_then(|host| host.split('.').next())
                .filter(|label| !label.is_empty())
                .map(str::to_owned)
        });

        Self {
            b2c: B2cConnection {
                host_name: non_blank(settings.b2c_host_name),
                client_id: non_blank(settings.b2c_client_id),
                client_secret: settings.b2c_client_secret,
                username: non_blank(settings.b2c_username),
                access_key: settings.b2c_access_key,
                code_version: non_blank(settings.b2c_code_version),
                instance_name,
                site_ids,
            },
            sf: SfConnection {
                host_name: non_blank(settings.sf_host_name),
                login_url: non_blank(settings.sf_login_url),
                username: non_blank(settings.sf_username),
                password: settings.sf_password,
                security_token: settings.sf_security_token,
                scratch_org_username: non_blank(settings.sf_scratch_org_username),
                scratch_org: ScratchOrgOptions {
                    profile: non_blank(settings.sf_scratch_org_profile)
                        .map(|p| p.to_ascii_lowercase()),
                    alias: non_blank(settings.sf_scratch_org_alias),
                    set_default: settings.sf_scratch_org_set_default.unwrap_or(false),
                    force_overwrite: settings.sf_scratch_org_force_overwrite.unwrap_or(false),
                    duration_days: settings.sf_scratch_org_duration_days,
                },
            },
        }
    }

    /// Check every property the given requirements need, reporting all
    /// missing names at once.
    pub fn validate(&self, requirements: &[Requirement]) -> CoreResult<()> {
        let mut missing = Vec::new();
        for requirement in requirements {
            for name in requirement.missing(self) {
                if !missing.contains(&name) {
                    missing.push(name);
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidEnvironment { missing })
        }
    }

    /// Property/value rows for display; secrets are masked.
    #[must_use]
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        fn plain(value: Option<&String>) -> String {
            value.cloned().unwrap_or_default()
        }
        fn masked(value: Option<&SecretValue>) -> String {
            value.map(SecretValue::preview).unwrap_or_default()
        }

        vec![
            (Requirement::B2C_HOSTNAME, plain(self.b2c.host_name.as_ref())),
            (Requirement::B2C_CLIENTID, plain(self.b2c.client_id.as_ref())),
            (Requirement::B2C_CLIENTSECRET, masked(self.b2c.client_secret.as_ref())),
            (Requirement::B2C_USERNAME, plain(self.b2c.username.as_ref())),
            (Requirement::B2C_ACCESSKEY, masked(self.b2c.access_key.as_ref())),
            (Requirement::B2C_CODEVERSION, plain(self.b2c.code_version.as_ref())),
            (Requirement::B2C_INSTANCENAME, plain(self.b2c.instance_name.as_ref())),
            (Requirement::B2C_SITEIDS, self.b2c.site_ids.join(", ")),
            (Requirement::SF_HOSTNAME, plain(self.sf.host_name.as_ref())),
            (Requirement::SF_LOGINURL, plain(self.sf.login_url.as_ref())),
            (Requirement::SF_USERNAME, plain(self.sf.username.as_ref())),
            (Requirement::SF_PASSWORD, masked(self.sf.password.as_ref())),
            (Requirement::SF_SECURITYTOKEN, masked(self.sf.security_token.as_ref())),
            (
                Requirement::SF_SCRATCHORGUSERNAME,
                plain(self.sf.scratch_org_username.as_ref()),
            ),
            (
                Requirement::SF_SCRATCHORGPROFILE,
                plain(self.sf.scratch_org.profile.as_ref()),
            ),
            (
                Requirement::SF_SCRATCHORGALIAS,
                plain(self.sf.scratch_org.alias.as_ref()),
            ),
            (
                Requirement::SF_SCRATCHORGSETDEFAULT,
                self.sf.scratch_org.set_default.to_string(),
            ),
            (
                Requirement::SF_SCRATCHORGFORCEOVERWRITE,
                self.sf.scratch_org.force_overwrite.to_string(),
            ),
            (
                Requirement::SF_SCRATCHORGDURATIONDAYS,
                self.sf
                    .scratch_org
                    .duration_days
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ),
        ]
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn split_site_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// A group of properties a command needs before it touches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Host, client id and client secret.
    B2cConnection,
    /// Business Manager user name and access key.
    B2cBusinessManagerUser,
    B2cCodeVersion,
    B2cSiteIds,
    B2cInstanceName,
    /// Login URL, user name, password and security token.
    SfLogin,
    SfHost,
}

impl Requirement {
    pub const B2C_HOSTNAME: &'static str = "B2C_HOSTNAME";
    pub const B2C_CLIENTID: &'static str = "B2C_CLIENTID";
    pub const B2C_CLIENTSECRET: &'static str = "B2C_CLIENTSECRET";
    pub const B2C_USERNAME: &'static str = "B2C_USERNAME";
    pub const B2C_ACCESSKEY: &'static str = "B2C_ACCESSKEY";
    pub const B2C_CODEVERSION: &'static str = "B2C_CODEVERSION";
    pub const B2C_INSTANCENAME: &'static str = "B2C_INSTANCENAME";
    pub const B2C_SITEIDS: &'static str = "B2C_SITEIDS";
    pub const SF_HOSTNAME: &'static str = "SF_HOSTNAME";
    pub const SF_LOGINURL: &'static str = "SF_LOGINURL";
    pub const SF_USERNAME: &'static str = "SF_USERNAME";
    pub const SF_PASSWORD: &'static str = "SF_PASSWORD";
    pub const SF_SECURITYTOKEN: &'static str = "SF_SECURITYTOKEN";
    pub const SF_SCRATCHORGUSERNAME: &'static str = "SF_SCRATCHORGUSERNAME";
    pub const SF_SCRATCHORGPROFILE: &'static str = "SF_SCRATCHORGPROFILE";
    pub const SF_SCRATCHORGALIAS: &'static str = "SF_SCRATCHORGALIAS";
    pub const SF_SCRATCHORGSETDEFAULT: &'static str = "SF_SCRATCHORGSETDEFAULT";
    pub const SF_SCRATCHORGFORCEOVERWRITE: &'static str = "SF_SCRATCHORGFORCEOVERWRITE";
    pub const SF_SCRATCHORGDURATIONDAYS: &'static str = "SF_SCRATCHORGDURATIONDAYS";

    fn missing(self, env: &EnvironmentDefinition) -> Vec<&'static str> {
        let b2c = &env.b2c;
        let sf = &env.sf;
        let checks: Vec<(bool, &'static str)> = match self {
            Self::B2cConnection => vec![
                (b2c.host().is_ok(), Self::B2C_HOSTNAME),
                (b2c.client_id().is_ok(), Self::B2C_CLIENTID),
                (b2c.client_secret().is_ok(), Self::B2C_CLIENTSECRET),
            ],
            Self::B2cBusinessManagerUser => vec![
                (b2c.username().is_ok(), Self::B2C_USERNAME),
                (b2c.access_key().is_ok(), Self::B2C_ACCESSKEY),
            ],
            Self::B2cCodeVersion => vec![(b2c.code_version().is_ok(), Self::B2C_CODEVERSION)],
            Self::B2cSiteIds => vec![(!b2c.site_ids.is_empty(), Self::B2C_SITEIDS)],
            Self::B2cInstanceName => {
                vec![(b2c.instance_name().is_ok(), Self::B2C_INSTANCENAME)]
            }
            Self::SfLogin => vec![
                (sf.login_url().is_ok(), Self::SF_LOGINURL),
                (sf.username().is_ok(), Self::SF_USERNAME),
                (sf.password().is_ok(), Self::SF_PASSWORD),
                (sf.security_token().is_ok(), Self::SF_SECURITYTOKEN),
            ],
            Self::SfHost => vec![(sf.host().is_ok(), Self::SF_HOSTNAME)],
        };

        checks
            .into_iter()
            .filter(|(present, _)| !present)
            .map(|(_, name)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EnvironmentSettings {
        EnvironmentSettings {
            b2c_host_name: Some("zzzz-001.sandbox.us01.dx.commercecloud.salesforce.com".into()),
            b2c_client_id: Some("client".into()),
            b2c_client_secret: Some("secret-value-long".into()),
            b2c_site_ids: Some("RefArch, RefArchGlobal,,".into()),
            ..Default::default()
        }
    }

    #[test]
    fn merge_prefers_self() {
        let flags = EnvironmentSettings {
            b2c_client_id: Some("from-flag".into()),
            ..Default::default()
        };
        let merged = flags.merge(settings());
        assert_eq!(merged.b2c_client_id.as_deref(), Some("from-flag"));
        assert!(merged.b2c_host_name.is_some());
    }

    #[test]
    fn site_ids_are_split_and_trimmed() {
        let env = EnvironmentDefinition::from_settings(settings());
        assert_eq!(env.b2c.site_ids, vec!["RefArch", "RefArchGlobal"]);
    }

    #[test]
    fn instance_name_defaults_to_host_label() {
        let env = EnvironmentDefinition::from_settings(settings());
        assert_eq!(env.b2c.instance_name.as_deref(), Some("zzzz-001"));

        let explicit = EnvironmentDefinition::from_settings(EnvironmentSettings {
            b2c_instance_name: Some("b2cInstanceA".into()),
            ..settings()
        });
        assert_eq!(explicit.b2c.instance_name.as_deref(), Some("b2cInstanceA"));
    }

    #[test]
    fn validate_reports_every_missing_property() {
        let env = EnvironmentDefinition::from_settings(settings());
        assert!(env
            .validate(&[Requirement::B2cConnection, Requirement::B2cSiteIds])
            .is_ok());

        let err = env
            .validate(&[Requirement::B2cCodeVersion, Requirement::SfLogin])
            .unwrap_err();
        match err {
            CoreError::InvalidEnvironment { missing } => assert_eq!(
                missing,
                vec![
                    "B2C_CODEVERSION",
                    "SF_LOGINURL",
                    "SF_USERNAME",
                    "SF_PASSWORD",
                    "SF_SECURITYTOKEN"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let env = EnvironmentDefinition::from_settings(EnvironmentSettings {
            b2c_code_version: Some("   ".into()),
            ..settings()
        });
        assert!(env.validate(&[Requirement::B2cCodeVersion]).is_err());
    }

    #[test]
    fn scratch_org_options_are_listed() {
        let env = EnvironmentDefinition::from_settings(EnvironmentSettings {
            sf_scratch_org_profile: Some(" Enhanced ".into()),
            sf_scratch_org_alias: Some("crm-sync".into()),
            sf_scratch_org_set_default: Some(true),
            sf_scratch_org_duration_days: Some(7),
            ..settings()
        });
        assert_eq!(env.sf.scratch_org.profile.as_deref(), Some("enhanced"));
        assert!(!env.sf.scratch_org.force_overwrite);

        let rows = env.display_rows();
        let value = |name: &str| {
            rows.iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(value(Requirement::SF_SCRATCHORGALIAS).as_deref(), Some("crm-sync"));
        assert_eq!(value(Requirement::SF_SCRATCHORGSETDEFAULT).as_deref(), Some("true"));
        assert_eq!(
            value(Requirement::SF_SCRATCHORGFORCEOVERWRITE).as_deref(),
            Some("false")
        );
        assert_eq!(value(Requirement::SF_SCRATCHORGDURATIONDAYS).as_deref(), Some("7"));
    }

    #[test]
    fn display_rows_mask_secrets() {
        let env = EnvironmentDefinition::from_settings(settings());
        let rows = env.display_rows();
        let secret = rows
            .iter()
            .find(|(name, _)| *name == Requirement::B2C_CLIENTSECRET)
            .map(|(_, value)| value.as_str());
        assert_eq!(secret, Some("secr..."));
        assert!(!format!("{env:?}").contains("secret-value-long"));
    }
}
