//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use survey_core::{
  anonymize::anonymize_address,
  response::{NewSurveyResponse, StoredSurveyResponse},
  store::SurveyStore,
  validate::OTHER_TOPIC_MESSAGE,
};
use survey_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use super::*;

const SALT: &str = "test-salt";
const CLIENT_IP: &str = "203.0.113.7";

fn config() -> ServerConfig {
  ServerConfig {
    host:                  "127.0.0.1".to_string(),
    port:                  8080,
    database_url:          ":memory:".to_string(),
    cors_origin:           "*".to_string(),
    ip_hash_salt:          SALT.to_string(),
    rate_limit_per_minute: 60,
  }
}

async fn make_state(config: ServerConfig) -> (AppState<SqliteStore>, Arc<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  (AppState::new(store.clone(), config), store)
}

/// A store whose backend is unreachable.
#[derive(Debug, thiserror::Error)]
#[error("connection to postgres://survey:hunter2@db/survey refused")]
struct Unreachable;

struct UnreachableStore;

impl SurveyStore for UnreachableStore {
  type Error = Unreachable;

  async fn insert_response(
    &self,
    _: NewSurveyResponse,
  ) -> Result<StoredSurveyResponse, Self::Error> {
    Err(Unreachable)
  }
}

async fn oneshot_raw<S>(
  state:   AppState<S>,
  method:  &str,
  uri:     &str,
  headers: Vec<(header::HeaderName, &str)>,
  body:    String,
) -> Response
where
  S: SurveyStore + 'static,
{
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = builder.body(Body::from(body)).unwrap();
  router(state).oneshot(req).await.unwrap()
}

async fn post_survey<S>(state: AppState<S>, body: &Value) -> Response
where
  S: SurveyStore + 'static,
{
  oneshot_raw(
    state,
    "POST",
    "/v1/survey",
    vec![
      (header::CONTENT_TYPE, "application/json"),
      (header::USER_AGENT, "Mozilla/5.0 (Test)"),
      (header::HeaderName::from_static("x-forwarded-for"), CLIENT_IP),
    ],
    body.to_string(),
  )
  .await
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn scenario_a() -> Value {
  json!({
    "age_group":     "18_24",
    "district":      "wicker",
    "topics":        ["umwelt_gruen"],
    "wants_updates": false,
  })
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
  let (state, _) = make_state(config()).await;
  let resp = oneshot_raw(state, "GET", "/v1/health", vec![], String::new()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!({ "ok": true }));
}

#[tokio::test]
async fn unknown_route_returns_404() {
  let (state, _) = make_state(config()).await;
  let resp = oneshot_raw(state, "GET", "/v1/responses", vec![], String::new()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Submissions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_submission_is_stored() {
  let (state, store) = make_state(config()).await;

  let resp = post_survey(state, &scenario_a()).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert_eq!(json_body(resp).await, json!({ "ok": true }));

  let rows = store.list_responses().await.unwrap();
  assert_eq!(rows.len(), 1);
  let row = &rows[0];
  assert_eq!(row.submission.email, None);
  assert_eq!(row.user_agent.as_deref(), Some("Mozilla/5.0 (Test)"));

  let ip_hash = row.ip_hash.as_deref().unwrap();
  assert_eq!(ip_hash.len(), 64);
  assert_eq!(Some(ip_hash.to_owned()), anonymize_address(Some(CLIENT_IP), SALT));
  assert!(!ip_hash.contains(CLIENT_IP));
}

#[tokio::test]
async fn identical_submissions_create_two_rows() {
  let (state, store) = make_state(config()).await;
  post_survey(state.clone(), &scenario_a()).await;
  post_survey(state, &scenario_a()).await;

  let hash = anonymize_address(Some(CLIENT_IP), SALT).unwrap();
  assert_eq!(store.count_by_ip_hash(&hash).await.unwrap(), 2);
}

#[tokio::test]
async fn unknown_address_stores_null_hash() {
  let (state, store) = make_state(config()).await;
  let resp = oneshot_raw(
    state,
    "POST",
    "/v1/survey",
    vec![(header::CONTENT_TYPE, "application/json")],
    scenario_a().to_string(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let rows = store.list_responses().await.unwrap();
  assert_eq!(rows[0].ip_hash, None);
  assert_eq!(rows[0].user_agent, None);
}

#[tokio::test]
async fn sonstiges_without_other_topic_returns_400() {
  let (state, store) = make_state(config()).await;
  let body = json!({
    "age_group":     "18_24",
    "district":      "wicker",
    "topics":        ["sonstiges"],
    "wants_updates": false,
  });

  let resp = post_survey(state, &body).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(body["errors"]["other_topic"], OTHER_TOPIC_MESSAGE);
  assert!(store.list_responses().await.unwrap().is_empty());
}

#[tokio::test]
async fn overlong_comment_returns_400() {
  let (state, store) = make_state(config()).await;
  let mut body = scenario_a();
  body["comment"] = json!("x".repeat(1201));

  let resp = post_survey(state, &body).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert!(body["errors"]["comment"].is_string(), "{body}");
  assert!(store.list_responses().await.unwrap().is_empty());
}

#[tokio::test]
async fn all_failures_are_reported_together() {
  let (state, _) = make_state(config()).await;
  let body = json!({
    "age_group":     "99_plus",
    "topics":        ["sonstiges"],
    "wants_updates": true,
  });

  let resp = post_survey(state, &body).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let errors = json_body(resp).await["errors"].clone();
  let mut paths: Vec<_> = errors.as_object().unwrap().keys().cloned().collect();
  paths.sort();
  assert_eq!(paths, vec!["age_group", "district", "email", "other_topic"]);
}

#[tokio::test]
async fn store_failure_returns_opaque_500() {
  let state = AppState::new(Arc::new(UnreachableStore), config());

  let resp = post_survey(state, &scenario_a()).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body = json_body(resp).await;
  assert_eq!(body, json!({ "ok": false }));
  assert!(!body.to_string().contains("hunter2"));
}

#[tokio::test]
async fn store_failure_is_not_reached_for_invalid_payloads() {
  let state = AppState::new(Arc::new(UnreachableStore), config());
  let resp  = post_survey(state, &json!({ "district": "wicker" })).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Body handling ────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_json_returns_400_on_body() {
  let (state, _) = make_state(config()).await;
  let resp = oneshot_raw(
    state,
    "POST",
    "/v1/survey",
    vec![(header::CONTENT_TYPE, "application/json")],
    "{\"age_group\": ".to_string(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(json_body(resp).await["errors"]["body"].is_string());
}

#[tokio::test]
async fn missing_content_type_returns_400() {
  let (state, _) = make_state(config()).await;
  let resp = oneshot_raw(state, "POST", "/v1/survey", vec![], scenario_a().to_string()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(json_body(resp).await["errors"]["body"].is_string());
}

#[tokio::test]
async fn oversized_body_returns_413() {
  let (state, store) = make_state(config()).await;
  let mut body = scenario_a();
  body["comment"] = json!("x".repeat(BODY_LIMIT_BYTES));

  let resp = post_survey(state, &body).await;
  assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
  assert!(store.list_responses().await.unwrap().is_empty());
}

// ── Boundary middleware ──────────────────────────────────────────────────────

#[tokio::test]
async fn requests_over_the_limit_get_429() {
  let (state, store) = make_state(ServerConfig {
    rate_limit_per_minute: 2,
    ..config()
  })
  .await;

  for _ in 0..2 {
    let resp = post_survey(state.clone(), &scenario_a()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key("ratelimit-remaining"));
  }

  let resp = post_survey(state, &scenario_a()).await;
  assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
  assert!(resp.headers().contains_key(header::RETRY_AFTER));
  assert_eq!(store.list_responses().await.unwrap().len(), 2);
}

#[tokio::test]
async fn one_router_counts_every_request() {
  let (state, _) = make_state(ServerConfig {
    rate_limit_per_minute: 2,
    ..config()
  })
  .await;
  let app = router(state);

  let mut statuses = Vec::new();
  for _ in 0..3 {
    let req = Request::builder()
      .method("POST")
      .uri("/v1/survey")
      .header(header::CONTENT_TYPE, "application/json")
      .header("x-forwarded-for", CLIENT_IP)
      .body(Body::from(scenario_a().to_string()))
      .unwrap();
    statuses.push(app.clone().oneshot(req).await.unwrap().status());
  }
  assert_eq!(statuses, vec![
    StatusCode::CREATED,
    StatusCode::CREATED,
    StatusCode::TOO_MANY_REQUESTS,
  ]);
}

#[tokio::test]
async fn security_headers_are_set() {
  let (state, _) = make_state(config()).await;
  let resp = oneshot_raw(state, "GET", "/v1/health", vec![], String::new()).await;
  let headers = resp.headers();
  assert_eq!(headers["x-content-type-options"], "nosniff");
  assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
  assert_eq!(headers["referrer-policy"], "no-referrer");
  assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
  let (state, _) = make_state(config()).await;
  let resp = oneshot_raw(
    state,
    "GET",
    "/v1/health",
    vec![(header::ORIGIN, "https://anywhere.example")],
    String::new(),
  )
  .await;
  assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn cors_preflight_honours_configured_origins() {
  let (state, _) = make_state(ServerConfig {
    cors_origin: "https://umfrage.floersheim.example".to_string(),
    ..config()
  })
  .await;

  let preflight = |origin: &'static str| {
    vec![
      (header::ORIGIN, origin),
      (header::ACCESS_CONTROL_REQUEST_METHOD, "POST"),
      (header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"),
    ]
  };

  let resp = oneshot_raw(
    state.clone(),
    "OPTIONS",
    "/v1/survey",
    preflight("https://umfrage.floersheim.example"),
    String::new(),
  )
  .await;
  assert_eq!(
    resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
    "https://umfrage.floersheim.example",
  );

  let resp = oneshot_raw(
    state,
    "OPTIONS",
    "/v1/survey",
    preflight("https://evil.example"),
    String::new(),
  )
  .await;
  assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
