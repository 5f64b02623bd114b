//! HTTP client for the Salesforce SOAP login and REST endpoints.

use std::time::Duration;

use crm_sync_core::{SecretValue, SfConfig};
use regex::Regex;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{SfdcError, SfdcResult};

const USER_AGENT: &str = concat!("crm-sync/", env!("CARGO_PKG_VERSION"));

/// An authenticated Salesforce session.
#[derive(Debug, Clone)]
pub struct SfSession {
    pub session_id: SecretValue,
    /// SOAP server URL returned by the login call.
    pub server_url: String,
}

impl SfSession {
    /// `scheme://host` of the org the session belongs to.
    #[must_use]
    pub fn instance_url(&self) -> String {
        let (scheme, rest) = self
            .server_url
            .split_once("://")
            .unwrap_or(("https", self.server_url.as_str()));
        let host = rest.split('/').next().unwrap_or(rest);
        format!("{scheme}://{host}")
    }
}

/// Client for one Salesforce API version.
#[derive(Debug, Clone)]
pub struct SalesforceClient {
    client: Client,
    api_version: String,
}

impl SalesforceClient {
    pub fn new(config: &SfConfig) -> SfdcResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_version: config.api_version.clone(),
        })
    }

    /// Partner SOAP login with user name, password and security token.
    pub async fn login(
        &self,
        login_url: &str,
        username: &str,
        password: &SecretValue,
        security_token: &SecretValue,
    ) -> SfdcResult<SfSession> {
        let url = format!(
            "{}/services/Soap/u/{}",
            login_url.trim_end_matches('/'),
            self.api_version
        );
        let envelope = login_envelope(username, password, security_token);

        debug!(%url, username, "logging in");
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let fault = capture(r"<faultstring>([^<]*)</faultstring>", &body)?
                .unwrap_or_else(|| format!("status {status}"));
            return Err(SfdcError::Login(fault));
        }

        parse_login_response(&body)
    }

    /// Invoke an autolaunched Flow through the custom actions endpoint.
    pub async fn run_flow(
        &self,
        instance_url: &str,
        session: &SfSession,
        flow_name: &str,
        inputs: Value,
    ) -> SfdcResult<Value> {
        let url = self.data_url(instance_url, &format!("actions/custom/flow/{flow_name}"));

        let response = self
            .client
            .post(&url)
            .bearer_auth(session.session_id.expose())
            .json(&serde_json::json!({ "inputs": inputs }))
            .send()
            .await?;

        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Run a SOQL query and return the records of the first page.
    pub async fn query(
        &self,
        instance_url: &str,
        session: &SfSession,
        soql: &str,
    ) -> SfdcResult<Vec<Value>> {
        let url = self.data_url(instance_url, "query");

        debug!(%soql, "querying org");
        let response = self
            .client
            .get(&url)
            .bearer_auth(session.session_id.expose())
            .query(&[("q", soql)])
            .send()
            .await?;

        let body = success_body(response).await?;
        let page: QueryPage = serde_json::from_str(&body)?;
        Ok(page.records)
    }

    /// Patch fields of one record.
    pub async fn update_record(
        &self,
        instance_url: &str,
        session: &SfSession,
        sobject: &str,
        id: &str,
        fields: &Value,
    ) -> SfdcResult<()> {
        let url = self.data_url(instance_url, &format!("sobjects/{sobject}/{id}"));

        let response = self
            .client
            .patch(&url)
            .bearer_auth(session.session_id.expose())
            .json(fields)
            .send()
            .await?;

        success_body(response).await?;
        Ok(())
    }

    fn data_url(&self, instance_url: &str, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{path}",
            instance_url.trim_end_matches('/'),
            self.api_version
        )
    }
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    records: Vec<Value>,
}

async fn success_body(response: Response) -> SfdcResult<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(SfdcError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Quote a value for a SOQL string literal.
#[must_use]
pub fn soql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn login_envelope(username: &str, password: &SecretValue, security_token: &SecretValue) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        xml_escape(username),
        xml_escape(password.expose()),
        xml_escape(security_token.expose()),
    )
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn capture(pattern: &str, body: &str) -> SfdcResult<Option<String>> {
    let re = Regex::new(pattern).map_err(|e| SfdcError::Login(e.to_string()))?;
    Ok(re
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned()))
}

/// Extract the session id and server URL from a login response.
pub(crate) fn parse_login_response(body: &str) -> SfdcResult<SfSession> {
    let session_id = capture(r"<sessionId>([^<]+)</sessionId>", body)?
        .ok_or_else(|| SfdcError::Login("response carries no sessionId".to_owned()))?;
    let server_url = capture(r"<serverUrl>([^<]+)</serverUrl>", body)?
        .ok_or_else(|| SfdcError::Login("response carries no serverUrl".to_owned()))?;

    Ok(SfSession {
        session_id: SecretValue::new(session_id),
        server_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <loginResponse>
      <result>
        <serverUrl>https://acme.my.salesforce.com/services/Soap/u/52.0/00D</serverUrl>
        <sessionId>00D!AQ0AQ.session</sessionId>
      </result>
    </loginResponse>
  </soapenv:Body>
</soapenv:Envelope>"#;

    #[test]
    fn login_response_yields_session() {
        let session = parse_login_response(LOGIN_RESPONSE).unwrap();
        assert_eq!(session.session_id.expose(), "00D!AQ0AQ.session");
        assert_eq!(session.instance_url(), "https://acme.my.salesforce.com");
        assert!(!format!("{session:?}").contains("AQ0AQ"));
    }

    #[test]
    fn login_response_without_session_is_rejected() {
        let err = parse_login_response("<result/>").unwrap_err();
        assert!(matches!(err, SfdcError::Login(_)));
    }

    #[test]
    fn soql_literals_escape_quotes() {
        assert_eq!(soql_literal("RefArch"), "'RefArch'");
        assert_eq!(soql_literal(r"O'Brien\x"), r"'O\'Brien\\x'");
    }

    #[test]
    fn envelope_escapes_credentials() {
        let envelope = login_envelope(
            "user@example.com",
            &SecretValue::new("p<ss&"),
            &SecretValue::new("token"),
        );
        assert!(envelope.contains("<n1:password>p&lt;ss&amp;token</n1:password>"));
    }
}
