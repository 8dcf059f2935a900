use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use taskboard_api::app::{router, services::AppServices};
use taskboard_core::{ProjectId, UserId};
use taskboard_infra::config::AppConfig;
use taskboard_infra::mailer::RecordingMailSender;
use taskboard_infra::store::InMemoryDocumentStore;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    mailer: Arc<RecordingMailSender>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        taskboard_observability::init_for_tests();

        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            bcrypt_cost: 4,
            ..AppConfig::default()
        };
        let store = Arc::new(InMemoryDocumentStore::new());
        let mailer = Arc::new(RecordingMailSender::new());
        let services = AppServices::new(store.clone(), store, mailer.clone(), &config);

        // Same router as prod, bound to an ephemeral port.
        let app = router(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            mailer,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: UserId, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": sub,
        "iat": now.timestamp(),
        "exp": (now + expires_in).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn register(client: &reqwest::Client, srv: &TestServer, email: &str) -> serde_json::Value {
    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "name": "Ada", "email": email, "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn projects_require_a_session_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases: [(Option<String>, &str); 4] = [
        (None, "No token provided"),
        (Some("Bearer".to_string()), "Token error"),
        (Some("Basic abc".to_string()), "Token malformatted"),
        (Some("Bearer not-a-jwt".to_string()), "Token invalid"),
    ];

    for (header, expected) in cases {
        let mut req = client.get(srv.url("/projects"));
        if let Some(h) = header {
            req = req.header(reqwest::header::AUTHORIZATION, h);
        }
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], expected);
    }
}

#[tokio::test]
async fn every_project_route_requires_a_session_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let id = ProjectId::new();
    let body = json!({ "title": "Launch", "tasks": [] });

    let requests = [
        client.get(srv.url("/projects")),
        client.post(srv.url("/projects")).json(&body),
        client.get(srv.url(&format!("/projects/{id}"))),
        client.put(srv.url(&format!("/projects/{id}"))).json(&body),
        client.delete(srv.url(&format!("/projects/{id}"))),
    ];

    for req in requests {
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "No token provided");
    }
}

#[tokio::test]
async fn rejected_writes_leave_the_project_untouched() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(JWT_SECRET, UserId::new(), ChronoDuration::minutes(10));

    let created: serde_json::Value = client
        .post(srv.url("/projects"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Launch", "tasks": [{ "title": "write docs" }] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["project"]["id"].as_str().unwrap().to_string();
    let path = srv.url(&format!("/projects/{id}"));

    let put = client
        .put(&path)
        .bearer_auth("garbage")
        .json(&json!({ "title": "Hijacked", "tasks": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::UNAUTHORIZED);

    let delete = client.delete(&path).bearer_auth("garbage").send().await.unwrap();
    assert_eq!(delete.status(), StatusCode::UNAUTHORIZED);

    let fetched = client.get(&path).bearer_auth(&token).send().await.unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    let body: serde_json::Value = fetched.json().await.unwrap();
    assert_eq!(body["title"], "Launch");
    assert_eq!(body["tasks"][0]["title"], "write docs");
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let expired = mint_jwt(JWT_SECRET, UserId::new(), ChronoDuration::seconds(-60));
    let foreign = mint_jwt("other-secret", UserId::new(), ChronoDuration::minutes(10));

    for token in [expired, foreign] {
        let res = client
            .get(srv.url("/projects"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Token invalid");
    }
}

#[tokio::test]
async fn minted_token_grants_access() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET, UserId::new(), ChronoDuration::minutes(10));

    let res = reqwest::Client::new()
        .get(srv.url("/projects"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn register_then_authenticate() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let registered = register(&client, &srv, "ada@example.com").await;
    assert_eq!(registered["user"]["email"], "ada@example.com");
    assert!(registered["user"].get("password_hash").is_none());
    assert!(registered["token"].as_str().is_some());

    let dup = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = dup.json().await.unwrap();
    assert_eq!(body["error"], "User already exists");

    let ok = client
        .post(srv.url("/auth/authenticate"))
        .json(&json!({ "email": "ada@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body: serde_json::Value = ok.json().await.unwrap();
    assert_eq!(body["user"]["id"], registered["user"]["id"]);

    let bad = client
        .post(srv.url("/auth/authenticate"))
        .json(&json!({ "email": "ada@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = bad.json().await.unwrap();
    assert_eq!(body["error"], "Invalid password");

    let missing = client
        .post(srv.url("/auth/authenticate"))
        .json(&json!({ "email": "nobody@example.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_rejected_before_the_service() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .post(srv.url("/auth/register"))
        .json(&json!({ "name": "Ada" }))
        .send()
        .await
        .unwrap();

    assert!(res.status().is_client_error());
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn forgot_and_reset_password_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "ada@example.com").await;

    let res = client
        .post(srv.url("/auth/forgot_password"))
        .json(&json!({ "email": "ada@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let sent = srv.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");
    let token = sent[0].context["token"].as_str().unwrap().to_string();

    let wrong = client
        .post(srv.url("/auth/reset_password"))
        .json(&json!({ "email": "ada@example.com", "token": "nope", "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = wrong.json().await.unwrap();
    assert_eq!(body["error"], "Token invalid");

    let reset = client
        .post(srv.url("/auth/reset_password"))
        .json(&json!({ "email": "ada@example.com", "token": token, "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status(), StatusCode::OK);

    let login = client
        .post(srv.url("/auth/authenticate"))
        .json(&json!({ "email": "ada@example.com", "password": "newpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    // Single use.
    let replay = client
        .post(srv.url("/auth/reset_password"))
        .json(&json!({ "email": "ada@example.com", "token": token, "password": "another1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn forgot_password_reports_mail_failure() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register(&client, &srv, "ada@example.com").await;
    srv.mailer.set_failing(true);

    let res = client
        .post(srv.url("/auth/forgot_password"))
        .json(&json!({ "email": "ada@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Cannot send forgot password e-mail.");
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn project_lifecycle_create_update_get_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let registered = register(&client, &srv, "ada@example.com").await;
    let token = registered["token"].as_str().unwrap().to_string();

    let created = client
        .post(srv.url("/projects"))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Launch",
            "description": "ship it",
            "tasks": [{ "title": "write docs" }, { "title": "cut release" }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let body: serde_json::Value = created.json().await.unwrap();
    let project = &body["project"];
    let id = project["id"].as_str().unwrap().to_string();
    assert_eq!(project["user"]["id"], registered["user"]["id"]);
    let titles: Vec<&str> = project["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["write docs", "cut release"]);

    let updated = client
        .put(srv.url(&format!("/projects/{id}")))
        .bearer_auth(&token)
        .json(&json!({ "title": "Launch v2", "tasks": [{ "title": "announce" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let body: serde_json::Value = updated.json().await.unwrap();
    assert_eq!(body["project"]["title"], "Launch v2");
    assert_eq!(body["project"]["tasks"].as_array().unwrap().len(), 1);

    let fetched = client
        .get(srv.url(&format!("/projects/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    let body: serde_json::Value = fetched.json().await.unwrap();
    assert_eq!(body["tasks"][0]["title"], "announce");

    let listed: serde_json::Value = client
        .get(srv.url("/projects"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let deleted = client
        .delete(srv.url(&format!("/projects/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = client
        .get(srv.url(&format!("/projects/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_project_id_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET, UserId::new(), ChronoDuration::minutes(10));

    let res = reqwest::Client::new()
        .get(srv.url("/projects/not-a-uuid"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid project id");
}

#[tokio::test]
async fn project_validation_errors_are_reported() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET, UserId::new(), ChronoDuration::minutes(10));

    let res = reqwest::Client::new()
        .post(srv.url("/projects"))
        .bearer_auth(token)
        .json(&json!({ "title": "  ", "tasks": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
