//! Domain types shared between the client and its consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subject on the student's study plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_mastered: bool,
    #[serde(default)]
    pub lesson_form: Option<String>,
    #[serde(default)]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub materials_count: Option<i64>,
}

/// A study material attached to a subject
///
/// Exactly one of `file` and `link` is set, depending on how the material
/// was uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub subject_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate statistics over all of a user's materials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialStats {
    pub total_count: i64,
    pub total_count_files: i64,
    pub total_count_links: i64,
    pub total_size_readable: String,
}

/// Originator of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Ai,
}

/// One entry of a subject's assistant chat history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub model: Option<String>,
}

/// A completed assistant answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantAnswer {
    pub answer: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub model: Option<String>,
}
