// tests/chatbot_api.rs

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{StubProvider, TestApp};
use pdms::users::RoleName;

const PROVIDER_ERROR: &str =
    "Sorry, there was an error processing your request. Please try again later.";

struct Setup {
    app: TestApp,
    provider: Arc<StubProvider>,
    token: String,
    project: i64,
    notes: i64,
    schedule: i64,
}

async fn setup_with(provider: StubProvider) -> Setup {
    let provider = Arc::new(provider);
    let app = TestApp::with_provider(provider.clone()).await;
    let (_, token) = app.admin().await;
    let project = app.project(&token, "Depot").await;
    let folder = app.folder(&token, project, "Docs", None).await;
    let notes = app
        .text_document(&token, project, folder, "site-notes", "Concrete grade C40 for all slabs.")
        .await;
    let schedule = app
        .text_document(&token, project, folder, "schedule", "Pour slabs in week 12.")
        .await;

    Setup {
        app,
        provider,
        token,
        project,
        notes,
        schedule,
    }
}

async fn setup() -> Setup {
    setup_with(StubProvider::default()).await
}

fn source_ids(answer: &Value) -> Vec<i64> {
    answer["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_project_question_uses_all_documents() {
    let s = setup().await;

    let (status, answer) = s
        .app
        .post(
            &format!("/api/projects/{}/chat", s.project),
            Some(&s.token),
            json!({ "question": "Which concrete grade and when is the pour?" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", answer);

    // Citations outside the context are dropped
    assert_eq!(source_ids(&answer), vec![s.notes, s.schedule]);
    assert_eq!(answer["sources"][0]["name"], "site-notes");
    assert_eq!(answer["sources"][0]["relevanceScore"], 1.0);
    assert!(answer["response"].as_str().unwrap().contains("[doc_999999]"));

    let messages = s.provider.last_call();
    let context = messages
        .iter()
        .find(|m| m.content.starts_with("Here is the context"))
        .expect("context message");
    assert_eq!(context.role, "system");
    assert!(context
        .content
        .contains(&format!("[doc_{}]: Concrete grade C40 for all slabs.", s.notes)));
    assert_eq!(messages.last().unwrap().role, "user");
}

#[tokio::test]
async fn test_named_document_question() {
    let s = setup().await;

    let (status, answer) = s
        .app
        .post(
            &format!("/api/projects/{}/chat", s.project),
            Some(&s.token),
            json!({ "question": "What is the document \"schedule\" about?" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_ids(&answer), vec![s.schedule]);

    let (status, answer) = s
        .app
        .post(
            &format!("/api/projects/{}/chat/document", s.project),
            Some(&s.token),
            json!({ "documentName": "site-notes", "question": "Which grade?" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_ids(&answer), vec![s.notes]);
}

#[tokio::test]
async fn test_missing_document_is_answered_without_provider() {
    let s = setup().await;

    let (status, answer) = s
        .app
        .post(
            &format!("/api/projects/{}/chat/document", s.project),
            Some(&s.token),
            json!({ "documentName": "budget", "question": "How much?" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        answer["response"],
        "Document 'budget' not found or you don't have access to it."
    );
    assert_eq!(answer["sources"], json!([]));
    assert_eq!(s.provider.call_count(), 0);
}

#[tokio::test]
async fn test_provider_failure_gives_fixed_answer() {
    let s = setup_with(StubProvider::failing()).await;

    let (status, answer) = s
        .app
        .post(
            &format!("/api/projects/{}/chat", s.project),
            Some(&s.token),
            json!({ "question": "Anything?" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["response"], PROVIDER_ERROR);
    assert_eq!(answer["sources"], json!([]));

    // The exchange is still recorded
    let (_, history) = s
        .app
        .get(&format!("/api/projects/{}/chat/history", s.project), &s.token)
        .await;
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[1]["content"], PROVIDER_ERROR);
}

#[tokio::test]
async fn test_unconfigured_provider_still_answers() {
    let app = TestApp::new().await;
    let (_, token) = app.admin().await;
    let project = app.project(&token, "Depot").await;

    let (status, answer) = app
        .post(
            &format!("/api/projects/{}/chat", project),
            Some(&token),
            json!({ "question": "Hello?" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(answer["response"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn test_history_is_chronological_and_limited() {
    let s = setup().await;
    let chat = format!("/api/projects/{}/chat", s.project);
    let history_uri = format!("/api/projects/{}/chat/history", s.project);

    s.app
        .post(&chat, Some(&s.token), json!({ "question": "first question" }))
        .await;
    s.app
        .post(&chat, Some(&s.token), json!({ "question": "second question" }))
        .await;

    let (status, history) = s.app.get(&history_uri, &s.token).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0]["type"], "USER");
    assert_eq!(history[0]["content"], "first question");
    assert_eq!(history[1]["type"], "BOT");
    assert_eq!(history[1]["references"][0]["documentId"], s.notes);
    assert_eq!(history[1]["references"][0]["documentName"], "site-notes");
    assert_eq!(history[0]["references"], json!([]));

    let (_, recent) = s
        .app
        .get(&format!("{}?limit=2", history_uri), &s.token)
        .await;
    assert_eq!(recent.as_array().unwrap().len(), 2);
    assert_eq!(recent[0]["content"], "second question");

    let (status, _) = s
        .app
        .get(&format!("{}?limit=0", history_uri), &s.token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = s
        .app
        .get(&format!("{}?limit=101", history_uri), &s.token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_question_validation() {
    let s = setup().await;
    let chat = format!("/api/projects/{}/chat", s.project);

    let (status, _) = s.app.post(&chat, Some(&s.token), json!({ "question": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = s
        .app
        .post(&chat, Some(&s.token), json!({ "question": "q".repeat(4001) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = s.app.post(&chat, Some(&s.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(s.provider.call_count(), 0);
}

#[tokio::test]
async fn test_project_chat_requires_access() {
    let s = setup().await;
    let (_, outsider) = s.app.user("out@example.com", &[RoleName::TeamMember]).await;

    let (status, _) = s
        .app
        .post(
            &format!("/api/projects/{}/chat", s.project),
            Some(&outsider),
            json!({ "question": "Let me in" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = s
        .app
        .post(
            "/api/projects/9999/chat",
            Some(&outsider),
            json!({ "question": "Anyone?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_global_chat_is_staff_only_and_separate() {
    let s = setup().await;
    let (_, member) = s.app.user("tm@example.com", &[RoleName::TeamMember]).await;

    let (status, answer) = s
        .app
        .post("/api/chat", Some(&s.token), json!({ "question": "Summarise everything" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source_ids(&answer), vec![s.notes, s.schedule]);

    let (status, _) = s
        .app
        .post("/api/chat", Some(&member), json!({ "question": "Me too" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Global history does not include project conversations
    s.app
        .post(
            &format!("/api/projects/{}/chat", s.project),
            Some(&s.token),
            json!({ "question": "project only" }),
        )
        .await;
    let (_, history) = s.app.get("/api/chat/history", &s.token).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["content"], "Summarise everything");

    // Every user reads only their own global conversation
    let (status, history) = s.app.get("/api/chat/history", &member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([]));
}
