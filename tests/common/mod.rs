#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use fieldcheck::metrics::{MetricsService, RawSample, SystemSampler};
use fieldcheck::{Config, FieldcheckError, FieldcheckState, fieldcheck_router};
use mockable::Clock;
use serde_json::{Value, json};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANON_KEY: &str = "anon-key";
pub const SERVICE_KEY: &str = "service-key";

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new() -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(2026, 6, 1, 7, 30, 0).unwrap()))
    }

    pub fn advance(&self, delta: Duration) {
        *self.0.lock().unwrap() += TimeDelta::from_std(delta).unwrap();
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Each call reports one more busy unit than the last.
pub struct StepSampler {
    pub calls: AtomicUsize,
}

impl SystemSampler for StepSampler {
    fn sample(&self) -> Result<RawSample, FieldcheckError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawSample {
            cpu_idle: 780.0 - 20.0 * n as f64,
            cpu_total: 800.0,
            cpu_count: 8,
            memory_total: 16_000_000_000,
            memory_free: 6_000_000_000,
            load_average: [0.8, 0.6, 0.4],
            process_uptime: Duration::from_secs(42),
            system_uptime: 86_400,
            hostname: Some("inspect-01".into()),
            platform: "linux".into(),
            arch: "x86_64".into(),
        })
    }
}

pub struct TestApp {
    pub server: MockServer,
    pub clock: Arc<MutableClock>,
    pub sampler: Arc<StepSampler>,
    pub router: Router,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let server = MockServer::start().await;
    let mut cfg = Config {
        data_url: Url::parse(&server.uri()).unwrap(),
        anon_key: ANON_KEY.to_string(),
        insecure_cookie: true,
        ..Config::default()
    };
    tweak(&mut cfg);

    let clock = Arc::new(MutableClock::new());
    let sampler = Arc::new(StepSampler {
        calls: AtomicUsize::new(0),
    });
    let metrics = MetricsService::new(cfg.metrics_ttl(), clock.clone(), sampler.clone());
    let state = FieldcheckState::new(cfg, metrics).expect("state builds");
    TestApp {
        server,
        clock,
        sampler,
        router: fieldcheck_router(state),
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("request failed")
    }

    /// Register `token` as a valid access token for `user_id`.
    pub async fn accept_token(&self, token: &str, user_id: Uuid) {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": user_id,
                "email": "inspector@example.com",
                "role": "authenticated",
                "user_metadata": {}
            })))
            .mount(&self.server)
            .await;
    }

    /// Accept activity log writes so best-effort logging stays quiet.
    pub async fn accept_activity_logs(&self) {
        Mock::given(method("POST"))
            .and(path("/rest/v1/activity_logs"))
            .respond_with(move |req: &wiremock::Request| {
                let mut row: Value = serde_json::from_slice(&req.body).unwrap();
                row["id"] = json!(Uuid::new_v4());
                ResponseTemplate::new(201).set_body_json(row)
            })
            .mount(&self.server)
            .await;
    }
}

pub fn not_found_body() -> Value {
    json!({
        "code": "PGRST116",
        "details": "The result contains 0 rows",
        "hint": null,
        "message": "JSON object requested, multiple (or no) rows returned"
    })
}

pub async fn json_body(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not json")
}

pub fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

pub fn with_json(builder: axum::http::request::Builder, body: &Value) -> Request<Body> {
    builder
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}
