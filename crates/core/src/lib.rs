//! StudyTailor core types and utilities

pub mod error;
pub mod storage;
pub mod task;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore};
pub use task::{TaskId, TaskState};
pub use types::{AssistantAnswer, ChatMessage, ChatSender, Material, MaterialStats, Subject};
