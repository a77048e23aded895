mod common;

use axum::http::{Request, StatusCode};
use common::{json_body, spawn_app, spawn_app_with, with_json};
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

const FALLBACK_ORG: &str = "11111111-1111-1111-1111-111111111111";

fn post_report(token: &str, body: &Value) -> Request<axum::body::Body> {
    with_json(
        Request::builder()
            .method("POST")
            .uri("/api/field-reports")
            .header("authorization", format!("Bearer {token}")),
        body,
    )
}

async fn echo_inserted_reports(app: &common::TestApp) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/field_reports"))
        .and(header("prefer", "return=representation"))
        .respond_with(move |req: &wiremock::Request| {
            let mut row: Value = serde_json::from_slice(&req.body).unwrap();
            row["id"] = json!(Uuid::new_v4());
            row["created_at"] = json!("2026-06-01T07:30:00Z");
            ResponseTemplate::new(201).set_body_json(row)
        })
        .expect(1)
        .mount(&app.server)
        .await;
}

#[tokio::test]
async fn omitted_organization_defaults_to_fallback() {
    let app = spawn_app().await;
    let user_id = Uuid::new_v4();
    let project_id = Uuid::new_v4();
    app.accept_token("tok", user_id).await;
    app.accept_activity_logs().await;
    echo_inserted_reports(&app).await;

    let resp = app
        .send(post_report(
            "tok",
            &json!({
                "project_id": project_id,
                "title": "Slab inspection, level 2",
                "report_type": "inspection",
                "report_date": "2026-06-01",
                "weather": "overcast"
            }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["organization_id"], json!(FALLBACK_ORG));
    assert_eq!(body["project_id"], json!(project_id));
    assert_eq!(body["created_by"], json!(user_id));
    assert_eq!(body["status"], json!("draft"));
}

#[tokio::test]
async fn provided_organization_is_sent_unchanged() {
    let app = spawn_app().await;
    let org = Uuid::new_v4();
    app.accept_token("tok", Uuid::new_v4()).await;
    app.accept_activity_logs().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/field_reports"))
        .and(body_partial_json(json!({ "organization_id": org })))
        .respond_with(move |req: &wiremock::Request| {
            let mut row: Value = serde_json::from_slice(&req.body).unwrap();
            row["id"] = json!(Uuid::new_v4());
            ResponseTemplate::new(201).set_body_json(row)
        })
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(post_report(
            "tok",
            &json!({
                "project_id": Uuid::new_v4(),
                "organization_id": org,
                "title": "Framing",
                "report_type": "daily",
                "report_date": "2026-06-02"
            }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["organization_id"], json!(org));
}

#[tokio::test]
async fn configured_default_organization_is_used() {
    let org = Uuid::new_v4();
    let app = spawn_app_with(|cfg| cfg.default_organization_id = org).await;
    app.accept_token("tok", Uuid::new_v4()).await;
    app.accept_activity_logs().await;
    echo_inserted_reports(&app).await;

    let resp = app
        .send(post_report(
            "tok",
            &json!({
                "project_id": Uuid::new_v4(),
                "title": "Roof sheeting",
                "report_type": "daily",
                "report_date": "2026-06-03"
            }),
        ))
        .await;

    assert_eq!(json_body(resp).await["organization_id"], json!(org));
}

#[tokio::test]
async fn missing_required_field_is_400_without_upstream_write() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/field_reports"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.server)
        .await;

    let resp = app
        .send(post_report(
            "tok",
            &json!({
                "project_id": Uuid::new_v4(),
                "report_type": "daily",
                "report_date": "2026-06-03"
            }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "title is required");
}

#[tokio::test]
async fn backend_rejection_surfaces_as_400_with_message() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/field_reports"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "details": "Key is not present in table \"projects\".",
            "hint": null,
            "message": "insert or update on table \"field_reports\" violates foreign key constraint"
        })))
        .mount(&app.server)
        .await;

    let resp = app
        .send(post_report(
            "tok",
            &json!({
                "project_id": Uuid::new_v4(),
                "title": "Pour",
                "report_type": "daily",
                "report_date": "2026-06-03"
            }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "23503");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("foreign key")
    );
}

#[tokio::test]
async fn unknown_report_is_404() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/field_reports"))
        .and(header("accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(406).set_body_json(common::not_found_body()))
        .mount(&app.server)
        .await;

    let resp = app
        .send(
            Request::builder()
                .uri(format!("/api/field-reports/{}", Uuid::new_v4()))
                .header("authorization", "Bearer tok")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_400_with_error_shape() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/field_reports"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.server)
        .await;

    let resp = app
        .send(post_report(
            "tok",
            &json!({
                "project_id": "not-a-uuid",
                "title": "Pour",
                "report_type": "daily",
                "report_date": "2026-06-03"
            }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("project_id")
    );
}

#[tokio::test]
async fn malformed_path_id_is_400_with_error_shape() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;

    let resp = app
        .send(
            Request::builder()
                .uri("/api/field-reports/not-a-uuid")
                .header("authorization", "Bearer tok")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn backend_outage_is_500() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/field_reports"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "message": "upstream connect error"
        })))
        .mount(&app.server)
        .await;

    let resp = app
        .send(
            Request::builder()
                .uri("/api/field-reports")
                .header("authorization", "Bearer tok")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["error"]["code"], "INTERNAL_ERROR");
}
