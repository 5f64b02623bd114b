//! Shared fixtures for crm-sync-sfdc integration tests.

#![allow(dead_code)]

use std::path::Path;

use crm_sync_core::{DxPathsConfig, EnvironmentDefinition, EnvironmentSettings};
use tempfile::TempDir;

pub const INSTANCE: &str = "zzzz_001";

pub const CONNECTED_APP_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ConnectedApp xmlns="http://soap.sforce.com/2006/04/metadata">
    <label>{{SITEID}} B2C CRM Sync</label>
    <oauthConfig>
        <consumerKey>{{CONSUMERKEY}}</consumerKey>
        <consumerSecret>{{CONSUMERSECRET}}</consumerSecret>
    </oauthConfig>
</ConnectedApp>
"#;

pub const TRUSTED_SITE_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CspTrustedSite xmlns="http://soap.sforce.com/2006/04/metadata">
    <endpointUrl>https://{{B2CHOSTNAME}}</endpointUrl>
    <description>{{INSTANCENAME}}</description>
</CspTrustedSite>
"#;

/// A temporary SFDX project with both metadata templates in place.
pub struct DxProject {
    pub dir: TempDir,
    pub dx: DxPathsConfig,
}

impl DxProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let dx = DxPathsConfig {
            base: dir.path().join("src/sfdc"),
            templates: dir.path().join("templates/sfdc"),
            config: dir.path().join("config-dx"),
            ..DxPathsConfig::default()
        };
        write_template(&dx.templates, "connectedApps", "connectedApp", CONNECTED_APP_TEMPLATE);
        write_template(&dx.templates, "cspTrustedSites", "cspTrustedSite", TRUSTED_SITE_TEMPLATE);
        Self { dir, dx }
    }
}

impl Default for DxProject {
    fn default() -> Self {
        Self::new()
    }
}

fn write_template(root: &Path, folder: &str, kind: &str, contents: &str) {
    let dir = root.join(folder);
    std::fs::create_dir_all(&dir).expect("create template dir");
    std::fs::write(dir.join(format!("template.{kind}-meta.xml")), contents).expect("write template");
}

pub fn settings() -> EnvironmentSettings {
    EnvironmentSettings {
        b2c_host_name: Some("zzzz-001.sandbox.us01.dx.commercecloud.salesforce.com".into()),
        b2c_instance_name: Some(INSTANCE.into()),
        b2c_site_ids: Some("RefArch,RefArch-Global".into()),
        sf_host_name: Some("acme.my.salesforce.com".into()),
        sf_login_url: Some("https://login.salesforce.com".into()),
        sf_username: Some("admin@acme.example".into()),
        sf_password: Some("password".into()),
        sf_security_token: Some("token".into()),
        ..EnvironmentSettings::default()
    }
}

pub fn environment() -> EnvironmentDefinition {
    EnvironmentDefinition::from_settings(settings())
}
