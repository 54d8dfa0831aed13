//! Integration tests for the typed API surface

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;
use serde_json::json;
use studytailor_client::types::{MaterialContent, MaterialUpload, RegisterRequest};
use studytailor_client::{ClientError, StudyTailorClient};
use studytailor_core::storage::MemoryTokenStore;
use studytailor_core::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TaskId, TokenStore};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Serialize)]
struct TestClaims {
    exp: i64,
}

fn make_jwt(ttl_secs: i64) -> String {
    let claims = TestClaims {
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"wiremock"),
    )
    .unwrap()
}

async fn logged_in_client(server: &MockServer) -> (StudyTailorClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    store
        .set(ACCESS_TOKEN_KEY, &make_jwt(3600))
        .await
        .unwrap();
    store.set(REFRESH_TOKEN_KEY, "refresh-1").await.unwrap();

    let client = StudyTailorClient::builder()
        .base_url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap();

    (client, store)
}

#[tokio::test]
async fn test_login_persists_token_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_json(json!({ "username": "ada", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "acc-1", "refresh": "ref-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = StudyTailorClient::builder()
        .base_url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap();

    let pair = client.login_with_password("ada", "hunter2").await.unwrap();
    assert_eq!(pair.access, "acc-1");

    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
        Some("acc-1")
    );
    assert_eq!(
        store.get(REFRESH_TOKEN_KEY).await.unwrap().as_deref(),
        Some("ref-1")
    );
    assert!(client.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn test_failed_login_persists_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = StudyTailorClient::builder()
        .base_url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap();

    let result = client.login_with_password("ada", "wrong").await;
    assert!(matches!(result, Err(ClientError::BadRequest(_))));
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_register_returns_pair_without_persisting() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/register/"))
        .and(body_json(json!({
            "username": "ada",
            "password": "hunter2",
            "email": "ada@example.edu",
            "album_number": "12345"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "acc-1", "refresh": "ref-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = StudyTailorClient::builder()
        .base_url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap();

    let pair = client
        .register(RegisterRequest {
            username: "ada".into(),
            password: "hunter2".into(),
            email: "ada@example.edu".into(),
            album_number: "12345".into(),
        })
        .await
        .unwrap();

    assert_eq!(pair.refresh, "ref-1");
    // account awaits email activation
    assert!(!client.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn test_verify_album_number() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/verify-album-number/"))
        .and(body_json(json!({ "album_number": "12345" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "valid": true, "exists": false })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = StudyTailorClient::new(server.uri()).unwrap();
    let verification = client.verify_album_number("12345").await.unwrap();
    assert!(verification.valid);
    assert!(!verification.exists);
    assert!(verification.message.is_none());
}

#[tokio::test]
async fn test_subjects_decode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subjects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "name": "Operating Systems",
                "is_mastered": true,
                "lesson_form": "lecture",
                "materials_count": 4
            },
            { "id": 2, "name": "Databases" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;
    let subjects = client.subjects().await.unwrap();

    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].is_mastered);
    assert_eq!(subjects[0].materials_count, Some(4));
    assert!(!subjects[1].is_mastered);
}

#[tokio::test]
async fn test_toggle_mastered_sends_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/subjects/7/mastered/"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "is_mastered": true })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;
    client.toggle_mastered(7).await.unwrap();
}

#[tokio::test]
async fn test_materials_roundtrip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subjects/7/materials/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 11,
                "subject_id": 7,
                "title": "Lecture 1",
                "file": "/media/materials/lecture1.pdf",
                "created_at": "2025-05-01T10:00:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/subjects/7/materials/11/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;

    let materials = client.materials(7).await.unwrap();
    assert_eq!(materials.len(), 1);
    assert_eq!(materials[0].file.as_deref(), Some("/media/materials/lecture1.pdf"));

    client.delete_material(7, 11).await.unwrap();
}

#[tokio::test]
async fn test_download_material_returns_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subjects/7/materials/11/download/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;
    let bytes = client.download_material(7, 11).await.unwrap();
    assert_eq!(bytes.as_ref(), b"%PDF-1.7");
}

#[tokio::test]
async fn test_all_materials_decode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/materials/get_all_materials/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 11, "subject_id": 7, "title": "Lecture 1", "link": "https://example.edu" }
            ],
            "stats": {
                "total_count": 1,
                "total_count_files": 0,
                "total_count_links": 1,
                "total_size_readable": "0 B"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;
    let all = client.all_materials().await.unwrap();
    assert_eq!(all.data.len(), 1);
    assert_eq!(all.stats.total_count_links, 1);
}

#[tokio::test]
async fn test_upload_material_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/subjects/7/materials/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;
    client
        .upload_material(
            7,
            &MaterialUpload {
                title: "Lecture notes".into(),
                description: Some("Week one".into()),
                content: MaterialContent::File {
                    filename: "notes.pdf".into(),
                    bytes: b"%PDF-1.7".to_vec(),
                },
            },
        )
        .await
        .unwrap();
}

// Multipart bodies cannot be cloned by reqwest, so the replay path builds a
// second form; it must behave exactly like a cloneable-body replay.
#[tokio::test]
async fn test_upload_material_replays_after_401() {
    let server = MockServer::start().await;
    let stale = make_jwt(3600);

    let store = Arc::new(MemoryTokenStore::new());
    store.set(ACCESS_TOKEN_KEY, &stale).await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "refresh-1").await.unwrap();

    let client = StudyTailorClient::builder()
        .base_url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/subjects/7/materials/"))
        .and(header("authorization", format!("Bearer {stale}")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/subjects/7/materials/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .upload_material(
            7,
            &MaterialUpload {
                title: "Lecture notes".into(),
                description: None,
                content: MaterialContent::Link("https://example.edu/notes".into()),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ask_assistant_and_wait_for_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/subject/7/assistant/"))
        .and(body_json(json!({ "question": "What is a B-tree?", "model": "gpt-4o" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "task_id": "task-42", "model": "gpt-4o" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // first poll sees the task still running, second sees completion
    Mock::given(method("GET"))
        .and(path("/task/task-42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/task/task-42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "result": {
                "answer": "A balanced search tree.",
                "elapsed_time": 1.5,
                "model": "gpt-4o"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;

    let started = client
        .ask_assistant(7, "What is a B-tree?", "gpt-4o")
        .await
        .unwrap();
    assert_eq!(started.task_id, TaskId::from("task-42"));

    let answer = client
        .wait_for_answer(&started.task_id, Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(answer.answer, "A balanced search tree.");
    assert_eq!(answer.model.as_deref(), Some("gpt-4o"));
}

#[tokio::test]
async fn test_wait_for_answer_surfaces_task_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/task/task-err/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "failed" })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;
    let result = client
        .wait_for_answer(&TaskId::from("task-err"), Duration::from_millis(10))
        .await;
    assert!(matches!(result, Err(ClientError::TaskFailed(_))));
}

#[tokio::test]
async fn test_chat_history_roundtrip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subject/7/chat-history/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "sender": "user", "text": "Explain joins" },
            {
                "sender": "ai",
                "text": "A join combines rows...",
                "timestamp": "2025-05-01T10:00:00Z",
                "elapsed_time": 2.1,
                "model": "gpt-4o"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/subject/7/chat-history/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = logged_in_client(&server).await;

    let history = client.chat_history(7).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].model.as_deref(), Some("gpt-4o"));

    client.clear_chat_history(7).await.unwrap();
}
