//! HTTP client for the OCAPI Data API, WebDAV and Account Manager.

use std::time::Duration;

use async_trait::async_trait;
use crm_sync_core::{ArtifactScope, B2cConfig, B2cConnection};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ActivationReceipt, AuthToken, CommerceApi, Credentials, DeployReceipt, DeployRequest};
use crate::error::{B2cError, B2cResult};
use crate::sites::SiteRecord;

const USER_AGENT: &str = concat!("crm-sync/", env!("CARGO_PKG_VERSION"));
const BM_GRANT_TYPE: &str = "urn:demandware:params:oauth:grant-type:client-id:dwsid:dwsecuretoken";

#[derive(serde::Deserialize)]
struct CodeVersionList {
    #[serde(default)]
    data: Vec<Value>,
}

/// Client bound to one B2C Commerce instance.
#[derive(Debug, Clone)]
pub struct OcapiClient {
    client: Client,
    base_url: String,
    account_manager_url: String,
    api_version: String,
    site_import_job_id: String,
    job_poll_interval: Duration,
    job_poll_attempts: u32,
}

impl OcapiClient {
    /// Create a client for the instance at `host`.
    pub fn new(config: &B2cConfig, host: &str) -> B2cResult<Self> {
        Self::with_urls(
            config,
            format!("https://{host}"),
            format!("https://{}", config.account_manager_host),
        )
    }

    /// Create a client for the connection's host.
    pub fn for_connection(config: &B2cConfig, connection: &B2cConnection) -> B2cResult<Self> {
        Self::new(config, connection.host()?)
    }

    /// Create a client with explicit instance and Account Manager base URLs.
    pub fn with_urls(
        config: &B2cConfig,
        base_url: impl Into<String>,
        account_manager_url: impl Into<String>,
    ) -> B2cResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            account_manager_url: account_manager_url.into().trim_end_matches('/').to_owned(),
            api_version: config.api_version.clone(),
            site_import_job_id: config.site_import_job_id.clone(),
            job_poll_interval: Duration::from_millis(config.job_poll_interval_ms),
            job_poll_attempts: config.job_poll_attempts.max(1),
        })
    }

    fn data_url(&self, path: &str) -> String {
        format!("{}/s/-/dw/data/{}/{}", self.base_url, self.api_version, path)
    }

    fn webdav_url(&self, path: &str) -> String {
        format!("{}/on/demandware.servlet/webdav/Sites/{}", self.base_url, path)
    }

    /// List every code version on the instance.
    pub async fn code_versions(&self, token: &AuthToken) -> B2cResult<Vec<Value>> {
        let response = self
            .client
            .get(self.data_url("code_versions"))
            .bearer_auth(token.bearer())
            .send()
            .await?;

        let list: CodeVersionList = read_json(response).await?;
        Ok(list.data)
    }

    /// Fetch a storefront site.
    pub async fn get_site(&self, token: &AuthToken, site_id: &str) -> B2cResult<SiteRecord> {
        let response = self
            .client
            .get(self.data_url(&format!("sites/{site_id}")))
            .bearer_auth(token.bearer())
            .send()
            .await?;

        read_json(response).await
    }

    /// Remove a cartridge from a site's cartridge path.
    ///
    /// Returns `false` when the cartridge was not on the path.
    pub async fn remove_cartridge(
        &self,
        token: &AuthToken,
        site_id: &str,
        cartridge: &str,
    ) -> B2cResult<bool> {
        let response = self
            .client
            .delete(self.data_url(&format!("sites/{site_id}/cartridges/{cartridge}")))
            .bearer_auth(token.bearer())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response).await?;
        Ok(true)
    }

    /// Fetch a customer profile, `None` when absent.
    pub async fn get_customer(
        &self,
        token: &AuthToken,
        customer_list_id: &str,
        customer_no: &str,
    ) -> B2cResult<Option<Value>> {
        let response = self
            .client
            .get(self.data_url(&format!(
                "customer_lists/{customer_list_id}/customers/{customer_no}"
            )))
            .bearer_auth(token.bearer())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    /// Create a customer profile with a fixed customer number.
    pub async fn create_customer(
        &self,
        token: &AuthToken,
        customer_list_id: &str,
        customer_no: &str,
        profile: &Value,
    ) -> B2cResult<Value> {
        let response = self
            .client
            .put(self.data_url(&format!(
                "customer_lists/{customer_list_id}/customers/{customer_no}"
            )))
            .bearer_auth(token.bearer())
            .json(profile)
            .send()
            .await?;

        read_json(response).await
    }

    /// Write a custom site preference value.
    pub async fn update_site_preference(
        &self,
        token: &AuthToken,
        site_id: &str,
        group_id: &str,
        instance_type: &str,
        attribute: &str,
        value: &str,
    ) -> B2cResult<Value> {
        let mut body = serde_json::Map::new();
        body.insert(format!("c_{attribute}"), Value::String(value.to_owned()));

        let response = self
            .client
            .patch(self.data_url(&format!(
                "sites/{site_id}/site_preferences/preference_groups/{group_id}/{instance_type}"
            )))
            .bearer_auth(token.bearer())
            .json(&Value::Object(body))
            .send()
            .await?;

        read_json(response).await
    }

    /// Fetch the OCAPI settings registered for an API client.
    pub async fn ocapi_config(&self, token: &AuthToken, client_id: &str) -> B2cResult<Value> {
        let response = self
            .client
            .get(self.data_url(&format!("ocapi_configs/{client_id}")))
            .bearer_auth(token.bearer())
            .send()
            .await?;

        read_json(response).await
    }

    /// Poll an import job execution until it finishes or is aborted.
    pub async fn await_execution(&self, token: &AuthToken, id: &str) -> B2cResult<Value> {
        let url = self.data_url(&format!(
            "jobs/{}/executions/{id}",
            self.site_import_job_id
        ));

        let mut status = String::new();
        for attempt in 1..=self.job_poll_attempts {
            let response = self
                .client
                .get(&url)
                .bearer_auth(token.bearer())
                .send()
                .await?;
            let raw: Value = read_json(response).await?;

            status = execution_status(&raw).to_owned();
            if is_terminal_status(&status) {
                debug!(execution = id, %status, attempt, "job execution settled");
                return Ok(raw);
            }

            debug!(execution = id, %status, attempt, "job execution still running");
            if attempt < self.job_poll_attempts {
                tokio::time::sleep(self.job_poll_interval).await;
            }
        }

        Err(B2cError::JobTimeout {
            execution: id.to_owned(),
            status,
            attempts: self.job_poll_attempts,
        })
    }

    async fn upload(&self, token: &AuthToken, url: &str, body: Vec<u8>) -> B2cResult<()> {
        let response = self
            .client
            .put(url)
            .bearer_auth(token.bearer())
            .body(body)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CommerceApi for OcapiClient {
    async fn authenticate(&self, credentials: &Credentials) -> B2cResult<AuthToken> {
        let request = match credentials {
            Credentials::Client {
                client_id,
                client_secret,
            } => self
                .client
                .post(format!("{}/dwsso/oauth2/access_token", self.account_manager_url))
                .basic_auth(client_id, Some(client_secret.expose()))
                .form(&[("grant_type", "client_credentials")]),
            Credentials::BusinessManager {
                client_id,
                client_secret,
                username,
                access_key,
            } => self
                .client
                .post(format!("{}/dw/oauth2/access_token", self.base_url))
                .query(&[("client_id", client_id.as_str())])
                .basic_auth(
                    format!("{username}:{}", access_key.expose()),
                    Some(client_secret.expose()),
                )
                .form(&[("grant_type", BM_GRANT_TYPE)]),
        };

        debug!(client_id = %credentials.client_id(), "requesting access token");
        let token: AuthToken = read_json(request.send().await?).await?;
        if token.access_token.is_empty() {
            return Err(B2cError::decode("token response carries an empty access_token"));
        }
        Ok(token)
    }

    async fn deploy(&self, token: &AuthToken, request: &DeployRequest) -> B2cResult<DeployReceipt> {
        let archive = &request.archive;
        let body = tokio::fs::read(&archive.resolved_path)
            .await
            .map_err(|e| B2cError::io(&archive.resolved_path, e))?;

        match archive.scope {
            ArtifactScope::Code => {
                let url = self.webdav_url(&format!("Cartridges/{}", archive.archive_name));
                self.upload(token, &url, body).await?;

                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(token.bearer())
                    .form(&[("method", "UNZIP")])
                    .send()
                    .await?;
                ensure_success(response).await?;

                let response = self
                    .client
                    .delete(&url)
                    .bearer_auth(token.bearer())
                    .send()
                    .await?;
                ensure_success(response).await?;

                let location = request
                    .code_version
                    .as_deref()
                    .map(|v| self.webdav_url(&format!("Cartridges/{v}")))
                    .unwrap_or(url);

                info!(archive = %archive.archive_name, %location, "code archive deployed");
                Ok(DeployReceipt {
                    version: request.code_version.clone(),
                    location,
                })
            }
            ArtifactScope::Data => {
                let url =
                    self.webdav_url(&format!("Impex/src/instance/{}", archive.archive_name));
                self.upload(token, &url, body).await?;

                info!(archive = %archive.archive_name, location = %url, "data archive uploaded");
                Ok(DeployReceipt {
                    version: Some(archive.archive_name.clone()),
                    location: url,
                })
            }
        }
    }

    async fn activate(
        &self,
        token: &AuthToken,
        scope: ArtifactScope,
        version: &str,
    ) -> B2cResult<ActivationReceipt> {
        match scope {
            ArtifactScope::Code => {
                let response = self
                    .client
                    .patch(self.data_url(&format!("code_versions/{version}")))
                    .bearer_auth(token.bearer())
                    .json(&json!({ "active": true }))
                    .send()
                    .await?;

                let raw: Value = read_json(response).await?;
                Ok(ActivationReceipt {
                    id: version.to_owned(),
                    raw,
                })
            }
            ArtifactScope::Data => {
                let response = self
                    .client
                    .post(self.data_url(&format!(
                        "jobs/{}/executions",
                        self.site_import_job_id
                    )))
                    .bearer_auth(token.bearer())
                    .json(&json!({ "file_name": version }))
                    .send()
                    .await?;

                let raw: Value = read_json(response).await?;
                let id = raw
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| B2cError::decode("job execution response has no id"))?
                    .to_owned();
                Ok(ActivationReceipt { id, raw })
            }
        }
    }

    async fn fetch_versions(
        &self,
        token: &AuthToken,
        scope: ArtifactScope,
        id: &str,
    ) -> B2cResult<Vec<Value>> {
        match scope {
            ArtifactScope::Code => self.code_versions(token).await,
            ArtifactScope::Data => {
                let raw = self.await_execution(token, id).await?;
                Ok(vec![execution_record(&raw)])
            }
        }
    }
}

fn execution_status(raw: &Value) -> &str {
    raw.get("execution_status")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn is_terminal_status(status: &str) -> bool {
    matches!(status, "finished" | "aborted")
}

/// Normalise a job execution into the version-record shape.
///
/// An execution counts as active once it finished with exit code `OK`.
fn execution_record(raw: &Value) -> Value {
    let status = execution_status(raw);
    let exit_code = raw
        .get("exit_status")
        .and_then(|s| s.get("code"))
        .and_then(Value::as_str);
    let modified = raw.get("end_time").or_else(|| raw.get("start_time"));

    json!({
        "id": raw.get("id"),
        "active": status == "finished" && exit_code == Some("OK"),
        "last_modification_time": modified,
        "execution_status": status,
        "exit_code": exit_code,
    })
}

async fn ensure_success(response: Response) -> B2cResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(B2cError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> B2cResult<T> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| B2cError::decode(e.to_string()))
}
