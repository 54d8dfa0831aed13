//! AI assistant API client methods
//!
//! Assistant answers are produced by backend background tasks: asking a
//! question returns a task id, which is polled until it reaches a terminal
//! state.

use super::StudyTailorClient;
use crate::error::ClientError;
use crate::types::{AskAssistantRequest, AskAssistantResponse, TaskStatusResponse};
use std::time::Duration;
use studytailor_core::{AssistantAnswer, ChatMessage, TaskId, TaskState};
use tracing::debug;

/// Polling cadence of the original web client
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

impl StudyTailorClient {
    /// Ask the assistant a question about a subject
    pub async fn ask_assistant(
        &self,
        subject_id: i64,
        question: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<AskAssistantResponse, ClientError> {
        let request = self
            .request(
                reqwest::Method::POST,
                &format!("/subject/{subject_id}/assistant/"),
            )
            .json(&AskAssistantRequest {
                question: question.into(),
                model: model.into(),
            });
        self.execute(request).await
    }

    /// Fetch the current state of an assistant task
    pub async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatusResponse, ClientError> {
        let request = self.request(reqwest::Method::GET, &format!("/task/{task_id}/"));
        self.execute(request).await
    }

    /// Poll an assistant task until it settles and return its answer
    pub async fn wait_for_answer(
        &self,
        task_id: &TaskId,
        poll_interval: Duration,
    ) -> Result<AssistantAnswer, ClientError> {
        loop {
            let status = self.task_status(task_id).await?;
            match status.status {
                TaskState::Completed => {
                    return status.result.ok_or_else(|| {
                        ClientError::TaskFailed("task completed without a result".to_string())
                    });
                }
                TaskState::Failed => {
                    return Err(ClientError::TaskFailed(format!(
                        "assistant task {task_id} failed"
                    )));
                }
                state => {
                    debug!(task_id = %task_id, state = ?state, "Assistant task still running");
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }

    /// Fetch the assistant chat history for a subject
    pub async fn chat_history(&self, subject_id: i64) -> Result<Vec<ChatMessage>, ClientError> {
        let request = self.request(
            reqwest::Method::GET,
            &format!("/subject/{subject_id}/chat-history/"),
        );
        self.execute(request).await
    }

    /// Delete the assistant chat history for a subject
    pub async fn clear_chat_history(&self, subject_id: i64) -> Result<(), ClientError> {
        let request = self.request(
            reqwest::Method::DELETE,
            &format!("/subject/{subject_id}/chat-history/"),
        );
        self.execute_empty(request).await
    }
}
