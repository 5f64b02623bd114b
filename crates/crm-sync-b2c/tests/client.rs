//! OcapiClient against an in-process stand-in for a B2C Commerce instance.

mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, delete, get, patch, post};
use axum::{Json, Router};
use common::{environment, version_record, Workspace, CODE_VERSION, INSTANCE};
use crm_sync_b2c::api::{AuthToken, CommerceApi, Credentials};
use crm_sync_b2c::cartridges::{self, RemovalOutcome};
use crm_sync_b2c::{oobo, ocapi_config, verify, B2cError, OcapiClient, Pipeline, Stage, StageError};
use crm_sync_core::{ArtifactScope, B2cConfig, OoboConfig};
use serde_json::{json, Value};

#[derive(Clone)]
struct Recorder {
    requests: Arc<Mutex<Vec<String>>>,
    import_exit_code: Arc<Mutex<&'static str>>,
    execution_polls: Arc<AtomicUsize>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            requests: Arc::default(),
            import_exit_code: Arc::new(Mutex::new("OK")),
            execution_polls: Arc::default(),
        }
    }
}

impl Recorder {
    fn fail_imports(&self) {
        *self.import_exit_code.lock().expect("lock") = "ERROR";
    }

    fn record(&self, method: &Method, uri: &Uri) {
        self.requests
            .lock()
            .expect("lock")
            .push(format!("{method} {}", uri.path()));
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock").clone()
    }
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer tok123")
}

async fn account_manager_token(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    recorder.record(&method, &uri);
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !basic || !body.contains("grant_type=") {
        return (StatusCode::UNAUTHORIZED, r#"{"error":"invalid_client"}"#).into_response();
    }
    Json(json!({ "access_token": "tok123", "token_type": "Bearer", "expires_in": 1799 }))
        .into_response()
}

async fn webdav(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> StatusCode {
    recorder.record(&method, &uri);
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    match method {
        Method::PUT => StatusCode::CREATED,
        Method::POST => StatusCode::CREATED,
        Method::DELETE => StatusCode::NO_CONTENT,
        _ => StatusCode::METHOD_NOT_ALLOWED,
    }
}

async fn activate_code_version(
    State(recorder): State<Recorder>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorder.record(&method, &uri);
    let mut record = version_record(&id, body["active"] == true);
    record["_resource_state"] = json!("abc");
    Json(record)
}

async fn list_code_versions(State(recorder): State<Recorder>, method: Method, uri: Uri) -> Json<Value> {
    recorder.record(&method, &uri);
    Json(json!({
        "_v": "21.3",
        "count": 2,
        "data": [version_record("v6", false), version_record(CODE_VERSION, true)]
    }))
}

async fn get_site(Path(site_id): Path<String>) -> Response {
    if site_id == "RefArch" {
        Json(json!({
            "id": "RefArch",
            "display_name": { "default": "RefArch" },
            "storefront_status": "online",
            "customer_list_link": { "customer_list_id": "RefArchCustomers" }
        }))
        .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            r#"{"fault":{"type":"SiteNotFoundException","message":"not found"}}"#,
        )
            .into_response()
    }
}

async fn remove_cartridge(Path((_site, cartridge)): Path<(String, String)>) -> StatusCode {
    if cartridge == "int_b2ccrmsync" {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_customer(Path((_list, customer_no)): Path<(String, String)>) -> Response {
    if customer_no == "OOBO-Existing" {
        Json(json!({ "customer_no": customer_no })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn create_customer(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn update_preference(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorder.record(&method, &uri);
    Json(body)
}

async fn ocapi_config_for(Path(client_id): Path<String>) -> Json<Value> {
    Json(json!({
        "client_id": client_id,
        "global": [{ "site_configs": [{ "api_type": "data" }, { "api_type": "shop" }] }],
        "sites": [{ "site_id": "Sites-RefArch-Site", "api_type": "shop" }]
    }))
}

async fn start_execution(
    State(recorder): State<Recorder>,
    Path(job): Path<String>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    recorder.record(&method, &uri);
    if body["file_name"] != format!("{INSTANCE}-data.zip") {
        return (StatusCode::BAD_REQUEST, r#"{"fault":{"type":"FileNotFound"}}"#).into_response();
    }
    Json(json!({ "id": "e1", "job_id": job, "execution_status": "pending" })).into_response()
}

async fn job_execution(
    State(recorder): State<Recorder>,
    Path((_job, id)): Path<(String, String)>,
    method: Method,
    uri: Uri,
) -> Json<Value> {
    recorder.record(&method, &uri);
    let poll = recorder.execution_polls.fetch_add(1, Ordering::SeqCst);
    if poll == 0 {
        return Json(json!({
            "id": id,
            "execution_status": "running",
            "start_time": "2021-03-02T10:00:00.000Z"
        }));
    }
    let code = *recorder.import_exit_code.lock().expect("lock");
    Json(json!({
        "id": id,
        "execution_status": "finished",
        "exit_status": { "code": code },
        "start_time": "2021-03-02T10:00:00.000Z",
        "end_time": "2021-03-02T10:00:05.000Z"
    }))
}

async fn start_instance() -> (String, Recorder) {
    let recorder = Recorder::default();
    let data = "/s/-/dw/data/v21_3";

    let app = Router::new()
        .route("/dwsso/oauth2/access_token", post(account_manager_token))
        .route("/dw/oauth2/access_token", post(account_manager_token))
        .route(
            "/on/demandware.servlet/webdav/Sites/Cartridges/:file",
            any(webdav),
        )
        .route(
            "/on/demandware.servlet/webdav/Sites/Impex/src/instance/:file",
            any(webdav),
        )
        .route(&format!("{data}/jobs/:job/executions"), post(start_execution))
        .route(&format!("{data}/jobs/:job/executions/:id"), get(job_execution))
        .route(
            &format!("{data}/code_versions/:id"),
            patch(activate_code_version),
        )
        .route(&format!("{data}/code_versions"), get(list_code_versions))
        .route(&format!("{data}/sites/:site_id"), get(get_site))
        .route(
            &format!("{data}/sites/:site_id/cartridges/:cartridge"),
            delete(remove_cartridge),
        )
        .route(
            &format!("{data}/customer_lists/:list/customers/:customer_no"),
            get(get_customer).put(create_customer),
        )
        .route(
            &format!("{data}/sites/:site_id/site_preferences/preference_groups/:group/:instance"),
            patch(update_preference),
        )
        .route(&format!("{data}/ocapi_configs/:client_id"), get(ocapi_config_for))
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr: SocketAddr = listener.local_addr().expect("listener addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test instance");
    });

    (format!("http://{addr}"), recorder)
}

fn client(base_url: &str) -> OcapiClient {
    let config = B2cConfig {
        job_poll_interval_ms: 10,
        job_poll_attempts: 5,
        ..B2cConfig::default()
    };
    OcapiClient::with_urls(&config, base_url, base_url).expect("client")
}

#[tokio::test]
async fn client_credentials_grant_returns_token() {
    let (base_url, _) = start_instance().await;
    let token = client(&base_url)
        .authenticate(&Credentials::client(&environment().b2c).expect("credentials"))
        .await
        .expect("token");

    assert_eq!(token.bearer(), "tok123");
    assert_eq!(token.expires_in, Some(1799));
}

#[tokio::test]
async fn business_manager_grant_uses_instance_endpoint() {
    let (base_url, recorder) = start_instance().await;
    let credentials = Credentials::business_manager(&environment().b2c).expect("credentials");
    client(&base_url)
        .authenticate(&credentials)
        .await
        .expect("token");

    assert_eq!(recorder.requests(), vec!["POST /dw/oauth2/access_token"]);
}

#[tokio::test]
async fn code_pipeline_uploads_unzips_and_activates() {
    let (base_url, recorder) = start_instance().await;
    let workspace = Workspace::new().with_archive(ArtifactScope::Code);
    let pipeline = Pipeline::new(Arc::new(client(&base_url)), workspace.paths.clone());

    let result = pipeline
        .run(&environment(), ArtifactScope::Code)
        .await
        .expect("pipeline succeeds");

    assert_eq!(result.summary().id, CODE_VERSION);
    assert!(result.summary().active);
    assert_eq!(
        recorder.requests(),
        vec![
            "POST /dwsso/oauth2/access_token".to_owned(),
            "PUT /on/demandware.servlet/webdav/Sites/Cartridges/b2cInstanceA-code.zip".to_owned(),
            "POST /on/demandware.servlet/webdav/Sites/Cartridges/b2cInstanceA-code.zip".to_owned(),
            "DELETE /on/demandware.servlet/webdav/Sites/Cartridges/b2cInstanceA-code.zip".to_owned(),
            "PATCH /s/-/dw/data/v21_3/code_versions/v7".to_owned(),
            "GET /s/-/dw/data/v21_3/code_versions".to_owned(),
        ]
    );
}

#[tokio::test]
async fn data_pipeline_waits_for_the_import_job() {
    let (base_url, recorder) = start_instance().await;
    let workspace = Workspace::new().with_archive(ArtifactScope::Data);
    let pipeline = Pipeline::new(Arc::new(client(&base_url)), workspace.paths.clone());

    let result = pipeline
        .run(&environment(), ArtifactScope::Data)
        .await
        .expect("import succeeds");

    assert_eq!(result.activation().id, "e1");
    assert_eq!(result.summary().id, "e1");
    assert!(result.summary().active);
    assert_eq!(
        result.summary().last_modification_time.as_deref(),
        Some("2021-03-02T10:00:05.000Z")
    );
    assert_eq!(recorder.execution_polls.load(Ordering::SeqCst), 2);
    assert_eq!(
        recorder.requests(),
        vec![
            "POST /dwsso/oauth2/access_token".to_owned(),
            "PUT /on/demandware.servlet/webdav/Sites/Impex/src/instance/b2cInstanceA-data.zip"
                .to_owned(),
            "POST /s/-/dw/data/v21_3/jobs/sfcc-site-archive-import/executions".to_owned(),
            "GET /s/-/dw/data/v21_3/jobs/sfcc-site-archive-import/executions/e1".to_owned(),
            "GET /s/-/dw/data/v21_3/jobs/sfcc-site-archive-import/executions/e1".to_owned(),
        ]
    );
}

#[tokio::test]
async fn failed_import_job_fails_the_pipeline() {
    let (base_url, recorder) = start_instance().await;
    recorder.fail_imports();
    let workspace = Workspace::new().with_archive(ArtifactScope::Data);
    let pipeline = Pipeline::new(Arc::new(client(&base_url)), workspace.paths.clone());

    let err = pipeline
        .run(&environment(), ArtifactScope::Data)
        .await
        .expect_err("import finished with ERROR");

    assert_eq!(err.stage(), Stage::Verify);
    assert!(matches!(
        err,
        StageError::Verification(B2cError::Inactive(ref id)) if id == "e1"
    ));
}

#[tokio::test]
async fn non_success_status_keeps_upstream_body() {
    let (base_url, _) = start_instance().await;
    let token = AuthToken::new("tok123");
    let err = client(&base_url)
        .get_site(&token, "Missing")
        .await
        .expect_err("site is missing");

    let (status, body) = err.upstream().expect("upstream");
    assert_eq!(status, 404);
    assert!(body.contains("SiteNotFoundException"));
}

#[tokio::test]
async fn environment_verification_splits_sites() {
    let (base_url, _) = start_instance().await;
    let outcome = verify::verify_environment(&client(&base_url), &environment())
        .await
        .expect("verification runs");

    assert_eq!(outcome.sites.verified.len(), 1);
    assert_eq!(outcome.sites.failed.len(), 1);
    assert_eq!(outcome.sites.failed[0].site_id, "RefArchGlobal");
    assert_eq!(outcome.sites.failed[0].status, Some(404));
    assert_eq!(
        outcome.code_version.as_ref().map(|v| v.id.as_str()),
        Some(CODE_VERSION)
    );
    assert!(!outcome.is_verified());
}

#[tokio::test]
async fn cartridge_removal_reports_missing_cartridges() {
    let (base_url, _) = start_instance().await;
    let client = client(&base_url);
    let token = AuthToken::new("tok123");
    let site = client.get_site(&token, "RefArch").await.expect("site");

    let results = cartridges::remove_cartridges(
        &client,
        &token,
        &[site],
        &["int_b2ccrmsync".to_owned(), "plugin_b2ccrmsync".to_owned()],
    )
    .await;

    let outcomes: Vec<_> = results.iter().map(|r| r.outcome.clone()).collect();
    assert_eq!(outcomes, vec![RemovalOutcome::Removed, RemovalOutcome::NotPresent]);
}

#[tokio::test]
async fn oobo_registration_creates_missing_customers() {
    let (base_url, recorder) = start_instance().await;
    let client = client(&base_url);
    let token = AuthToken::new("tok123");
    let site = client.get_site(&token, "RefArch").await.expect("site");

    let registrations =
        oobo::register_customers(&client, &token, &[site], &OoboConfig::default())
            .await
            .expect("registration");

    assert_eq!(registrations.len(), 1);
    let registration = &registrations[0];
    assert!(!registration.exists);
    assert_eq!(registration.customer_list_id, "RefArchCustomers");
    assert_eq!(registration.profile["customer_no"], "OOBO-RefArch");
    assert!(recorder.requests().contains(
        &"PATCH /s/-/dw/data/v21_3/sites/RefArch/site_preferences/preference_groups/B2CCRMSync/sandbox"
            .to_owned()
    ));
}

#[tokio::test]
async fn ocapi_config_is_audited_to_disk() {
    let (base_url, _) = start_instance().await;
    let workspace = Workspace::new();
    let audit_dir = workspace.dir.path().join("config-dx");

    let report = ocapi_config::fetch_ocapi_config(&client(&base_url), &environment(), &audit_dir)
        .await
        .expect("config fetched");

    assert_eq!(report.global.len(), 2);
    assert_eq!(report.sites[0].0, "RefArch");
    let audit_path = report.audit_path.expect("audit path");
    assert!(audit_path.ends_with("b2cInstanceA.ocapi-config.json"));
    let audited: Value =
        serde_json::from_str(&std::fs::read_to_string(audit_path).expect("read")).expect("json");
    assert_eq!(audited["client_id"], "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
}
