//! Connected-app and trusted-site generation against a temporary SFDX project.

mod common;

use common::{environment, DxProject, INSTANCE};
use crm_sync_core::EnvironmentDefinition;
use crm_sync_sfdc::connected_apps::{CONSUMER_KEY_LEN, CONSUMER_SECRET_LEN};
use crm_sync_sfdc::{create_connected_apps, create_trusted_site, SfdcError, TemplateSet};
use serde_json::Value;

#[test]
fn connected_apps_are_rendered_per_site() {
    let project = DxProject::new();
    let templates = TemplateSet::new(&project.dx);
    let env = environment();

    let report = create_connected_apps(
        &templates,
        &project.dx.config,
        "connectedAppCredentials.json",
        INSTANCE,
        "B2CCRMSync",
        &env.b2c.site_ids,
    )
    .expect("connected apps");

    let app_ids: Vec<_> = report.apps.iter().map(|a| a.app_id.as_str()).collect();
    assert_eq!(
        app_ids,
        ["zzzz_001_RefArch_B2CCRMSync", "zzzz_001_RefArchGlobal_B2CCRMSync"]
    );

    let rendered = std::fs::read_to_string(&report.apps[0].file_path).expect("read app");
    assert!(rendered.contains("<label>RefArch B2C CRM Sync</label>"));
    assert!(!rendered.contains("{{"));
    assert!(report.apps[0]
        .file_path
        .ends_with("connectedApps/zzzz_001_RefArch_B2CCRMSync.connectedApp-meta.xml"));

    assert!(report
        .credentials_path
        .ends_with("config-dx/zzzz_001.connectedAppCredentials.json"));
    let credentials: Value = serde_json::from_str(
        &std::fs::read_to_string(&report.credentials_path).expect("read credentials"),
    )
    .expect("json");
    let entry = &credentials["credentials"]["RefArch"];
    assert_eq!(entry["appId"], "zzzz_001_RefArch_B2CCRMSync");
    assert_eq!(
        entry["consumerKey"].as_str().map(str::len),
        Some(CONSUMER_KEY_LEN)
    );
    assert_eq!(
        entry["consumerSecret"].as_str().map(str::len),
        Some(CONSUMER_SECRET_LEN)
    );
    assert!(rendered.contains(entry["consumerKey"].as_str().expect("key")));
}

#[test]
fn repeated_sites_get_one_connected_app() {
    let project = DxProject::new();
    let site_ids: Vec<String> = ["RefArch", "RefArch", "RefArch-Global", "RefArch"]
        .into_iter()
        .map(String::from)
        .collect();

    let report = create_connected_apps(
        &TemplateSet::new(&project.dx),
        &project.dx.config,
        "connectedAppCredentials.json",
        INSTANCE,
        "B2CCRMSync",
        &site_ids,
    )
    .expect("connected apps");

    assert_eq!(report.apps.len(), 2);
    let credentials: Value = serde_json::from_str(
        &std::fs::read_to_string(&report.credentials_path).expect("read credentials"),
    )
    .expect("json");
    assert_eq!(
        credentials["siteIds"],
        serde_json::json!(["RefArch", "RefArch-Global"])
    );
    assert_eq!(
        credentials["credentials"].as_object().map(|m| m.len()),
        Some(2)
    );
}

#[test]
fn credential_file_is_written_without_sites() {
    let project = DxProject::new();

    let report = create_connected_apps(
        &TemplateSet::new(&project.dx),
        &project.dx.config,
        "connectedAppCredentials.json",
        INSTANCE,
        "B2CCRMSync",
        &[],
    )
    .expect("connected apps");

    assert!(report.apps.is_empty());
    let credentials: Value = serde_json::from_str(
        &std::fs::read_to_string(&report.credentials_path).expect("read credentials"),
    )
    .expect("json");
    assert_eq!(credentials["siteIds"], serde_json::json!([]));
    assert_eq!(credentials["credentials"], serde_json::json!({}));
}

#[test]
fn trusted_site_points_at_instance_host() {
    let project = DxProject::new();
    let path = create_trusted_site(&TemplateSet::new(&project.dx), &environment())
        .expect("trusted site");

    assert!(path.ends_with("cspTrustedSites/zzzz_001.cspTrustedSite-meta.xml"));
    let rendered = std::fs::read_to_string(path).expect("read");
    assert!(rendered
        .contains("<endpointUrl>https://zzzz-001.sandbox.us01.dx.commercecloud.salesforce.com</endpointUrl>"));
    assert!(rendered.contains("<description>zzzz_001</description>"));
}

#[test]
fn trusted_site_requires_an_instance() {
    let project = DxProject::new();
    let err = create_trusted_site(
        &TemplateSet::new(&project.dx),
        &EnvironmentDefinition::default(),
    )
    .expect_err("no instance configured");

    assert!(matches!(err, SfdcError::Environment(_)));
    assert!(err.to_string().contains("B2C_INSTANCENAME"));
}
