//! Subjects API client methods

use super::StudyTailorClient;
use crate::error::ClientError;
use serde_json::json;
use studytailor_core::Subject;

impl StudyTailorClient {
    /// List the student's subjects
    pub async fn subjects(&self) -> Result<Vec<Subject>, ClientError> {
        let request = self.request(reqwest::Method::GET, "/subjects/");
        self.execute(request).await
    }

    /// Toggle a subject's mastered flag
    pub async fn toggle_mastered(&self, subject_id: i64) -> Result<(), ClientError> {
        let request = self
            .request(
                reqwest::Method::PUT,
                &format!("/subjects/{subject_id}/mastered/"),
            )
            .json(&json!({}));
        self.execute_empty(request).await
    }
}
