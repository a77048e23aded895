mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{get, json_body, not_found_body, spawn_app, with_json};
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", "Bearer tok")
}

fn project_row(id: Uuid) -> Value {
    json!({
        "id": id,
        "name": "Lot 12 subdivision",
        "status": "active",
        "project_type": "general"
    })
}

fn echo_with_id() -> impl Fn(&wiremock::Request) -> ResponseTemplate + Send + Sync + 'static {
    |req: &wiremock::Request| {
        let mut row: Value = serde_json::from_slice(&req.body).unwrap();
        row["id"] = json!(Uuid::new_v4());
        ResponseTemplate::new(201).set_body_json(row)
    }
}

#[tokio::test]
async fn create_applies_defaults_and_records_activity() {
    let app = spawn_app().await;
    let user_id = Uuid::new_v4();
    app.accept_token("tok", user_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/projects"))
        .and(body_partial_json(json!({
            "name": "Lot 12 subdivision",
            "status": "active",
            "project_type": "general",
            "created_by": user_id
        })))
        .respond_with(echo_with_id())
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/activity_logs"))
        .and(body_partial_json(json!({ "action": "project.created", "user_id": user_id })))
        .respond_with(echo_with_id())
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(with_json(
            authed("POST", "/api/projects"),
            &json!({ "name": "  Lot 12 subdivision " }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["name"], "Lot 12 subdivision");
}

#[tokio::test]
async fn create_rejects_inverted_dates() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/projects"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.server)
        .await;

    let resp = app
        .send(with_json(
            authed("POST", "/api/projects"),
            &json!({ "name": "Lot 3", "start_date": "2026-07-01", "end_date": "2026-06-01" }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn anonymous_create_is_401() {
    let app = spawn_app().await;
    let resp = app
        .send(with_json(
            Request::builder().method("POST").uri("/api/projects"),
            &json!({ "name": "Lot 3" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_sends_only_supplied_fields() {
    let app = spawn_app().await;
    let id = Uuid::new_v4();
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/projects"))
        .and(query_param("id", format!("eq.{id}")))
        .and(body_partial_json(json!({ "status": "on_hold" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_row(id)))
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(with_json(
            authed("PATCH", &format!("/api/projects/{id}")),
            &json!({ "status": "on_hold" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let requests = app.server.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|r| r.method.as_str() == "PATCH")
        .unwrap();
    let sent: Value = serde_json::from_slice(&patch.body).unwrap();
    assert!(sent.get("name").is_none());
    assert!(sent.get("updated_at").is_some());
}

#[tokio::test]
async fn empty_update_is_400_without_upstream_write() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let resp = app
        .send(with_json(
            authed("PATCH", &format!("/api/projects/{}", Uuid::new_v4())),
            &json!({}),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["message"], "no fields to update");
}

#[tokio::test]
async fn delete_returns_removed_id() {
    let app = spawn_app().await;
    let id = Uuid::new_v4();
    app.accept_token("tok", Uuid::new_v4()).await;
    app.accept_activity_logs().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/projects"))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_row(id)))
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(
            authed("DELETE", &format!("/api/projects/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "id": id, "deleted": true }));
}

#[tokio::test]
async fn deleting_unknown_project_is_404() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/projects"))
        .respond_with(ResponseTemplate::new(406).set_body_json(not_found_body()))
        .mount(&app.server)
        .await;

    let resp = app
        .send(
            authed("DELETE", &format!("/api/projects/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_project_read_relays_caller_token() {
    let app = spawn_app().await;
    let id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .and(query_param("id", format!("eq.{id}")))
        .and(wiremock::matchers::header("authorization", "Bearer viewer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_row(id)))
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(
            get(&format!("/api/projects/{id}"))
                .header("cookie", "fc-access-token=viewer")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["id"], json!(id));
}

#[tokio::test]
async fn members_are_listed_for_project() {
    let app = spawn_app().await;
    let project_id = Uuid::new_v4();
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/members"))
        .and(query_param("project_id", format!("eq.{project_id}")))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": Uuid::new_v4(),
                "project_id": project_id,
                "user_id": Uuid::new_v4(),
                "role": "owner"
            },
            { "id": Uuid::new_v4(), "project_id": project_id, "user_id": Uuid::new_v4() }
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(
            authed("GET", &format!("/api/projects/{project_id}/members"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["role"], "owner");
}

#[tokio::test]
async fn adding_member_defaults_role() {
    let app = spawn_app().await;
    let project_id = Uuid::new_v4();
    let member_id = Uuid::new_v4();
    app.accept_token("tok", Uuid::new_v4()).await;
    app.accept_activity_logs().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/members"))
        .and(body_partial_json(json!({
            "project_id": project_id,
            "user_id": member_id,
            "role": "member"
        })))
        .respond_with(echo_with_id())
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(with_json(
            authed("POST", &format!("/api/projects/{project_id}/members")),
            &json!({ "user_id": member_id }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["user_id"], json!(member_id));
}

#[tokio::test]
async fn adding_member_without_user_is_400() {
    let app = spawn_app().await;
    app.accept_token("tok", Uuid::new_v4()).await;

    let resp = app
        .send(with_json(
            authed("POST", &format!("/api/projects/{}/members", Uuid::new_v4())),
            &json!({ "role": "viewer" }),
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["message"], "user_id is required");
}

#[tokio::test]
async fn removing_member_filters_on_both_ids() {
    let app = spawn_app().await;
    let project_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    app.accept_token("tok", Uuid::new_v4()).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/members"))
        .and(query_param("project_id", format!("eq.{project_id}")))
        .and(query_param("user_id", format!("eq.{user_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": Uuid::new_v4(),
            "project_id": project_id,
            "user_id": user_id
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let resp = app
        .send(
            authed(
                "DELETE",
                &format!("/api/projects/{project_id}/members/{user_id}"),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["deleted"], json!(true));
}
