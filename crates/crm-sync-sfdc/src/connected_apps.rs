//! Connected-app metadata and credentials for each verified storefront.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crm_sync_core::layout;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::error::{SfdcError, SfdcResult};
use crate::templates::{self, TemplateSet};

const FOLDER: &str = "connectedApps";
const KIND: &str = "connectedApp";

/// URL-safe alphabet for generated keys.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

pub const CONSUMER_KEY_LEN: usize = 128;
pub const CONSUMER_SECRET_LEN: usize = 32;

/// Generated credentials for one connected app.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAppCredentials {
    pub app_id: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

/// Contents of the credential file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialFile {
    pub generated_at: DateTime<Utc>,
    pub site_ids: Vec<String>,
    pub credentials: BTreeMap<String, ConnectedAppCredentials>,
}

/// One rendered connected app.
#[derive(Debug, Clone)]
pub struct ConnectedAppInstance {
    pub site_id: String,
    pub app_id: String,
    pub file_path: PathBuf,
}

/// Outcome of generating connected apps.
#[derive(Debug, Clone)]
pub struct ConnectedAppReport {
    pub apps: Vec<ConnectedAppInstance>,
    pub credentials_path: PathBuf,
}

/// Random string over the URL-safe alphabet.
#[must_use]
pub fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Keep ASCII letters, digits and underscores; connected-app names allow nothing else.
#[must_use]
pub fn clean_site_id(site_id: &str) -> String {
    site_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// `<instance>_<cleanSiteId>_<permset>`
#[must_use]
pub fn connected_app_id(instance_name: &str, site_id: &str, permset_name: &str) -> String {
    format!("{instance_name}_{}_{permset_name}", clean_site_id(site_id))
}

/// Site ids in first-seen order, without repeats.
#[must_use]
pub fn unique_site_ids(site_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    site_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Render a connected app for every distinct site and write the credential
/// map to `<credentials_dir>/<instance>.<credentials_file_name>`.
///
/// All metadata files are written before the credential file. The
/// credential file is written even when `site_ids` is empty.
pub fn create_connected_apps(
    templates: &TemplateSet,
    credentials_dir: &Path,
    credentials_file_name: &str,
    instance_name: &str,
    permset_name: &str,
    site_ids: &[String],
) -> SfdcResult<ConnectedAppReport> {
    layout::ensure_dir(&templates.output_dir(FOLDER))?;
    let template = templates.load(FOLDER, KIND)?;
    let site_ids = unique_site_ids(site_ids);

    let mut apps = Vec::with_capacity(site_ids.len());
    let mut credentials = BTreeMap::new();

    for site_id in &site_ids {
        let app_id = connected_app_id(instance_name, site_id, permset_name);
        let consumer_key = random_token(CONSUMER_KEY_LEN);
        let consumer_secret = random_token(CONSUMER_SECRET_LEN);

        let contents = templates::render(
            &template,
            &[
                ("SITEID", site_id.as_str()),
                ("CONSUMERKEY", consumer_key.as_str()),
                ("CONSUMERSECRET", consumer_secret.as_str()),
            ],
        );
        let file_name = format!("{app_id}.{KIND}{}", templates.meta_extension());
        let file_path = templates.write(FOLDER, &file_name, &contents)?;

        info!(site_id = %site_id, app_id = %app_id, path = %file_path.display(), "connected app rendered");

        credentials.insert(
            site_id.clone(),
            ConnectedAppCredentials {
                app_id: app_id.clone(),
                consumer_key,
                consumer_secret,
            },
        );
        apps.push(ConnectedAppInstance {
            site_id: site_id.clone(),
            app_id,
            file_path,
        });
    }

    let file = CredentialFile {
        generated_at: Utc::now(),
        site_ids,
        credentials,
    };

    layout::ensure_dir(credentials_dir)?;
    let credentials_path = credentials_dir.join(format!("{instance_name}.{credentials_file_name}"));
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(&credentials_path, json).map_err(|e| SfdcError::io(&credentials_path, e))?;

    Ok(ConnectedAppReport {
        apps,
        credentials_path,
    })
}
