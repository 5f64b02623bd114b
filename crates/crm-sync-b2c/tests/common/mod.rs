//! Shared fixtures for crm-sync-b2c integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use crm_sync_b2c::ArtifactReference;
use crm_sync_core::{
    ArtifactScope, EnvironmentDefinition, EnvironmentSettings, PathsConfig,
};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const INSTANCE: &str = "b2cInstanceA";
pub const CODE_VERSION: &str = "v7";

/// A temporary deploy root, optionally holding archives.
pub struct Workspace {
    pub dir: TempDir,
    pub paths: PathsConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = PathsConfig {
            deploy_root: dir.path().join("build"),
            source_root: dir.path().join("src"),
            ..PathsConfig::default()
        };
        Self { dir, paths }
    }

    /// Writes a placeholder archive for the scope and returns its path.
    pub fn with_archive(self, scope: ArtifactScope) -> Self {
        let path = self.archive_path(scope);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create deploy dir");
        std::fs::write(&path, b"PK\x05\x06").expect("write archive");
        self
    }

    pub fn archive_path(&self, scope: ArtifactScope) -> PathBuf {
        ArtifactReference::resolve(&self.paths, INSTANCE, scope).resolved_path
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

pub fn settings() -> EnvironmentSettings {
    EnvironmentSettings {
        b2c_host_name: Some("zzzz-001.sandbox.us01.dx.commercecloud.salesforce.com".into()),
        b2c_client_id: Some("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".into()),
        b2c_client_secret: Some("client-secret-value".into()),
        b2c_username: Some("bm-user@example.com".into()),
        b2c_access_key: Some("bm-access-key-value".into()),
        b2c_code_version: Some(CODE_VERSION.into()),
        b2c_instance_name: Some(INSTANCE.into()),
        b2c_site_ids: Some("RefArch,RefArchGlobal".into()),
        ..EnvironmentSettings::default()
    }
}

pub fn environment() -> EnvironmentDefinition {
    EnvironmentDefinition::from_settings(settings())
}

/// A code-version record as the Data API returns it.
pub fn version_record(id: &str, active: bool) -> Value {
    json!({
        "_type": "code_version",
        "id": id,
        "active": active,
        "activation_time": "2021-03-02T10:00:00.000Z",
        "cartridges": ["int_b2ccrmsync", "plugin_b2ccrmsync"],
        "compatibility_mode": "21.2",
        "last_modification_time": "2021-03-02T09:59:00.000Z",
        "rollback": false,
        "total_size": 204_800,
        "web_dav_url": format!(
            "https://zzzz-001.sandbox.us01.dx.commercecloud.salesforce.com/on/demandware.servlet/webdav/Sites/Cartridges/{id}"
        )
    })
}
