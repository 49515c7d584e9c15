// tests/common/mod.rs
// Shared harness: an in-memory service behind the real router

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use pdms::api::build_router;
use pdms::auth::hash_password;
use pdms::chatbot::{ChatMessage, ChatProvider};
use pdms::config::PdmsConfig;
use pdms::db;
use pdms::state::AppState;
use pdms::users::{RoleName, RoleStore, UserStore};

pub const PASSWORD: &str = "Passw0rd@1";
const BOUNDARY: &str = "pdms-test-boundary";

lazy_static! {
    static ref DOC_LABEL: Regex = Regex::new(r"\[doc_\d+\]").unwrap();
}

/// Cites every document label it was given, plus one that was never in context
#[derive(Default)]
pub struct StubProvider {
    pub fail: bool,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl StubProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Vec<ChatMessage> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if self.fail {
            anyhow::bail!("provider unavailable");
        }

        let mut cited = Vec::new();
        for message in messages.iter().filter(|m| m.role == "system") {
            for label in DOC_LABEL.find_iter(&message.content) {
                cited.push(label.as_str().to_string());
            }
        }
        Ok(format!("Stub answer citing {} [doc_999999]", cited.join(" ")))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub pool: SqlitePool,
    pub storage: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    pub async fn with_provider(provider: Arc<dyn ChatProvider>) -> Self {
        Self::build(Some(provider)).await
    }

    async fn build(provider: Option<Arc<dyn ChatProvider>>) -> Self {
        let storage = TempDir::new().expect("create storage dir");
        let config = PdmsConfig::for_tests(storage.path().to_str().expect("utf-8 temp path"));
        let pool = db::init(&config.database, &config.auth)
            .await
            .expect("init test database");

        let state = Arc::new(AppState::new(pool.clone(), config, provider));
        let router = build_router(state.clone());

        Self {
            router,
            state,
            pool,
            storage,
        }
    }

    /// Insert a user directly, bypassing the admin-only endpoint
    pub async fn create_user(&self, email: &str, name: &str, roles: &[RoleName]) -> i64 {
        let role_store = RoleStore::new(self.pool.clone());
        let mut role_ids = Vec::new();
        for role in roles {
            let role = role_store.get_by_name(*role).await.unwrap().unwrap();
            role_ids.push(role.id);
        }

        let hash = hash_password(PASSWORD, 4).unwrap();
        UserStore::new(self.pool.clone())
            .create(email, &hash, name, &role_ids)
            .await
            .unwrap()
            .id
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/auth/login",
                None,
                serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// Create a user and return (id, access token)
    pub async fn user(&self, email: &str, roles: &[RoleName]) -> (i64, String) {
        let name = email.split('@').next().unwrap_or(email);
        let id = self.create_user(email, name, roles).await;
        let token = self.login(email).await;
        (id, token)
    }

    pub async fn admin(&self) -> (i64, String) {
        self.user("admin@example.com", &[RoleName::Admin]).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Multipart POST with text fields and an optional (filename, content type, bytes) file part
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, file)))
            .unwrap();
        self.send(request).await
    }

    /// Create a project and return its id
    pub async fn project(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .post("/projects", Some(token), serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    pub async fn folder(&self, token: &str, project_id: i64, name: &str, parent: Option<i64>) -> i64 {
        let (status, body) = self
            .post(
                "/api/folders",
                Some(token),
                serde_json::json!({
                    "name": name,
                    "projectId": project_id,
                    "parentFolderId": parent,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create folder failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    pub async fn add_member(&self, token: &str, project_id: i64, user_id: i64, role: &str) {
        let (status, body) = self
            .post(
                &format!("/projects/{}/members", project_id),
                Some(token),
                serde_json::json!({ "userId": user_id, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add member failed: {}", body);
    }

    /// Upload a plain-text document and return its id
    pub async fn text_document(
        &self,
        token: &str,
        project_id: i64,
        folder_id: i64,
        name: &str,
        text: &str,
    ) -> i64 {
        let project = project_id.to_string();
        let folder = folder_id.to_string();
        let filename = format!("{}.txt", name);
        let (status, body) = self
            .upload(
                "/api/documents",
                token,
                &[("name", name), ("projectId", project.as_str()), ("folderId", folder.as_str())],
                Some((filename.as_str(), "text/plain", text.as_bytes())),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "upload failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
