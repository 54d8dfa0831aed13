//! Background task types for the assistant pipeline
//!
//! Assistant answers are produced server-side by background workers; clients
//! receive a task id and poll its state over REST.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-issued identifier for an assistant task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// State of an assistant task as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Task is queued but not yet started
    Pending,
    /// Task is currently running
    Processing,
    /// Task completed successfully; the result is available
    Completed,
    /// Task failed
    Failed,
}

impl TaskState {
    /// Check if the task is terminal (completed or failed)
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
