//! Integration tests for the application commands
//!
//! Each test builds an `AppContext` around an in-memory store and a
//! recording navigator, with every backend served by one WireMock server.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use modelhub_app::{
    finish_job, job_status, list_published, login, logout, model_url, select_project,
    select_region, start_job, AppContext, LoginDetails,
};
use modelhub_common::storage::{keys, LocalStore, MemoryStore};
use modelhub_domain::{
    ApiConfig, Config, HttpConfig, JobAction, ModelHubError, PollerConfig, StorageConfig,
};
use modelhub_infra::api::JobRequest;
use modelhub_infra::{RecordingNavigator, Reply};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    store: Arc<MemoryStore>,
    navigator: Arc<RecordingNavigator>,
    ctx: AppContext,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let root = server.uri();

    let mut job_scheduler = BTreeMap::new();
    job_scheduler.insert("US_EAST".to_string(), format!("{root}/scheduler/"));
    let config = Config {
        api: ApiConfig {
            base_url: format!("{root}/api/"),
            data_url: format!("{root}/data/"),
            redirect_uri: "https://login.example.com/".to_string(),
            refresh_backend_tag: "imax".to_string(),
            static_proxy_target: Some("https://models.example.com/".to_string()),
        },
        job_scheduler,
        poller: PollerConfig { interval_ms: 10 },
        http: HttpConfig::default(),
        storage: StorageConfig::default(),
    };

    let store = Arc::new(MemoryStore::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let ctx = AppContext::with_parts(config, store.clone(), navigator.clone())
        .expect("context should build");

    Harness { server, store, navigator, ctx }
}

fn stored(store: &MemoryStore, key: &str) -> Option<String> {
    store.get_item(key).expect("memory store is infallible")
}

fn sign_in(ctx: &AppContext, access_token: &str, refresh_token: Option<&str>) {
    let details = LoginDetails {
        refresh_token: refresh_token.map(str::to_string),
        ..LoginDetails::new(access_token)
    };
    login(ctx, &details).expect("login should succeed");
}

#[tokio::test]
async fn login_and_logout_manage_the_credential_pair() {
    let h = harness().await;

    let details = LoginDetails {
        refresh_token: Some("r1".to_string()),
        project_id: Some("proj-9".to_string()),
        repo_name: Some("churn-repo".to_string()),
        username: Some("dana".to_string()),
        ..LoginDetails::new("a1")
    };
    login(&h.ctx, &details).unwrap();
    assert_eq!(stored(&h.store, keys::ACCESS_TOKEN).as_deref(), Some("a1"));
    assert_eq!(stored(&h.store, keys::REFRESH_TOKEN).as_deref(), Some("r1"));
    assert_eq!(stored(&h.store, keys::DISPLAY_PROJECT_ID).as_deref(), Some("proj-9"));
    assert_eq!(stored(&h.store, keys::REPO_NAME).as_deref(), Some("churn-repo"));
    assert_eq!(stored(&h.store, keys::USERNAME).as_deref(), Some("dana"));

    logout(&h.ctx).unwrap();
    assert_eq!(stored(&h.store, keys::ACCESS_TOKEN), None);
    assert_eq!(stored(&h.store, keys::REFRESH_TOKEN), None);
    assert_eq!(stored(&h.store, keys::USERNAME), None);
}

#[tokio::test]
async fn login_rejects_blank_access_token() {
    let h = harness().await;
    let err = login(&h.ctx, &LoginDetails::new("  ")).unwrap_err();
    assert!(matches!(err, ModelHubError::InvalidInput(_)));

    let blank_project = LoginDetails { project_id: Some(" ".to_string()), ..LoginDetails::new("a1") };
    let err = login(&h.ctx, &blank_project).unwrap_err();
    assert!(matches!(err, ModelHubError::InvalidInput(_)));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn region_selection_requires_a_configured_scheduler() {
    let h = harness().await;

    assert_eq!(select_region(&h.ctx, "us east").unwrap(), "US_EAST");
    assert_eq!(stored(&h.store, keys::REGION).as_deref(), Some("us east"));

    let err = select_region(&h.ctx, "ap south").unwrap_err();
    assert!(matches!(err, ModelHubError::Config(_)));
    assert_eq!(stored(&h.store, keys::REGION).as_deref(), Some("us east"));
}

#[tokio::test]
async fn publish_runs_until_success_and_marks_the_version_published() {
    let h = harness().await;
    sign_in(&h.ctx, "a1", Some("r1"));
    select_region(&h.ctx, "us east").unwrap();
    select_project(&h.ctx, "proj-9").unwrap();

    Mock::given(method("POST"))
        .and(path("/scheduler/v1/publish_model"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "build_id": { "location": "queue/5" } })),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scheduler/v1/jenkins_status"))
        .and(query_param("action", "mlflow-publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "build_status": "SUCCESS" })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/published_models"))
        .and(query_param("name", "churn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "run_id": "run-1" }])))
        .expect(1)
        .mount(&h.server)
        .await;

    let request = JobRequest::Publish {
        run_id: "run-1".to_string(),
        model_name: "churn".to_string(),
        version: "3".to_string(),
    };
    let job = start_job(&h.ctx, &request).await.unwrap().expect("job accepted");
    assert_eq!(job.in_progress_message(), JobAction::Publish.in_progress_message());

    let summary = tokio::time::timeout(Duration::from_secs(5), finish_job(job, "run-1"))
        .await
        .expect("watch finishes");

    assert_eq!(summary.outcome, "succeeded");
    assert_eq!(summary.location, "queue/5");
    assert_eq!(summary.published, Some(true));
}

#[tokio::test]
async fn failed_unpublish_reports_the_terminal_status() {
    let h = harness().await;
    sign_in(&h.ctx, "a1", Some("r1"));
    select_region(&h.ctx, "us east").unwrap();

    Mock::given(method("DELETE"))
        .and(path("/scheduler/v1/publish_model/run-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "build_id": { "location": "queue/6" } })),
        )
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scheduler/v1/jenkins_status"))
        .and(query_param("action", "mlflow-remove-version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "build_status": "FAILURE" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let request =
        JobRequest::Unpublish { run_id: "run-1".to_string(), model_name: "churn".to_string() };
    let job = start_job(&h.ctx, &request).await.unwrap().expect("job accepted");
    let summary = tokio::time::timeout(Duration::from_secs(5), finish_job(job, "run-1"))
        .await
        .expect("watch finishes");

    assert_eq!(summary.outcome, "failed");
    assert_eq!(summary.status.as_deref(), Some("FAILURE"));
    assert_eq!(summary.published, None);
}

#[tokio::test]
async fn publish_without_region_fails_before_any_request() {
    let h = harness().await;
    sign_in(&h.ctx, "a1", None);

    let request = JobRequest::Publish {
        run_id: "run-1".to_string(),
        model_name: "churn".to_string(),
        version: "1".to_string(),
    };
    let err = start_job(&h.ctx, &request).await.unwrap_err();

    assert!(matches!(err, ModelHubError::Config(ref m) if m.contains("region")));
    assert!(h.server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn status_query_redirects_when_refresh_token_is_rejected() {
    let h = harness().await;
    sign_in(&h.ctx, "stale", Some("revoked"));
    select_region(&h.ctx, "us east").unwrap();

    Mock::given(method("GET"))
        .and(path("/scheduler/v1/jenkins_status"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "access_token expired" })),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login/refresh_token"))
        .respond_with(ResponseTemplate::new(203))
        .expect(1)
        .mount(&h.server)
        .await;

    let reply = job_status(&h.ctx, JobAction::Publish, "queue/1").await.unwrap();

    assert!(reply.is_redirected());
    assert_eq!(h.navigator.last().as_deref(), Some("https://login.example.com/"));
}

#[tokio::test]
async fn published_listing_tolerates_null_body() {
    let h = harness().await;
    sign_in(&h.ctx, "a1", None);

    Mock::given(method("GET"))
        .and(path("/data/published_models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&h.server)
        .await;

    match list_published(&h.ctx, None).await.unwrap() {
        Reply::Data(models) => assert!(models.is_empty()),
        Reply::Redirected => panic!("unexpected redirect"),
    }
}

#[tokio::test]
async fn model_url_joins_proxy_target_project_and_ids() {
    let h = harness().await;
    select_project(&h.ctx, "proj-9").unwrap();

    let url = model_url(&h.ctx, "run-1", "42").unwrap();
    assert_eq!(url, "https://models.example.com/proj-9/42-run-1");
    assert!(h.server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn model_url_needs_a_project_and_a_proxy_target() {
    let mut h = harness().await;

    let err = model_url(&h.ctx, "run-1", "42").unwrap_err();
    assert!(matches!(err, ModelHubError::NotFound(_)));

    select_project(&h.ctx, "proj-9").unwrap();
    assert!(matches!(model_url(&h.ctx, "", "42"), Err(ModelHubError::InvalidInput(_))));

    h.ctx.config.api.static_proxy_target = None;
    let err = model_url(&h.ctx, "run-1", "42").unwrap_err();
    assert!(matches!(err, ModelHubError::Config(_)));
}
