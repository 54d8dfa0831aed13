//! Request and response types for the StudyTailor REST API

use serde::{Deserialize, Serialize};
use studytailor_core::{AssistantAnswer, Material, MaterialStats, TaskId, TaskState};

/// Credentials for `POST /login/`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload for `POST /register/`
///
/// Registration requires a university album number and an email address for
/// the activation link.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub album_number: String,
}

/// Access/refresh token pair issued at login and registration
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body of `POST /token/refresh/`
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Response of `POST /token/refresh/`
///
/// A rotated refresh token is only present when the backend rotates on
/// refresh; the observed backend does not.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Response of `POST /verify-album-number/`
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumVerification {
    pub valid: bool,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /subject/{id}/assistant/`
#[derive(Debug, Clone, Serialize)]
pub struct AskAssistantRequest {
    pub question: String,
    pub model: String,
}

/// Response of `POST /subject/{id}/assistant/`
#[derive(Debug, Clone, Deserialize)]
pub struct AskAssistantResponse {
    pub task_id: TaskId,
    #[serde(default)]
    pub model: Option<String>,
}

/// Response of `GET /task/{id}/`
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    pub status: TaskState,
    #[serde(default)]
    pub result: Option<AssistantAnswer>,
}

/// Response of `GET /materials/get_all_materials/`
#[derive(Debug, Clone, Deserialize)]
pub struct AllMaterialsResponse {
    pub data: Vec<Material>,
    pub stats: MaterialStats,
}

/// A new material to attach to a subject
///
/// Materials are either an uploaded file or an external link.
#[derive(Debug, Clone)]
pub struct MaterialUpload {
    pub title: String,
    pub description: Option<String>,
    pub content: MaterialContent,
}

/// Content of a material upload
#[derive(Debug, Clone)]
pub enum MaterialContent {
    File { filename: String, bytes: Vec<u8> },
    Link(String),
}
