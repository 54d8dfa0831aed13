//! Authentication API client methods
//!
//! These endpoints are public: they are sent without a bearer credential and
//! never enter session recovery, so a stale stored token cannot interfere
//! with logging in.

use super::StudyTailorClient;
use crate::error::ClientError;
use crate::types::{AlbumVerification, LoginRequest, RegisterRequest, TokenPair};
use serde_json::json;

impl StudyTailorClient {
    /// Exchange credentials for a token pair and persist it
    ///
    /// On success the session is authenticated and subsequent requests carry
    /// the new access token.
    pub async fn login_with_password(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<TokenPair, ClientError> {
        let request = self.request(reqwest::Method::POST, "/login/").json(&LoginRequest {
            username: username.into(),
            password: password.into(),
        });
        let pair: TokenPair = self.execute_public(request).await?;
        self.login(&pair.access, &pair.refresh).await?;
        Ok(pair)
    }

    /// Register a new account
    ///
    /// The backend issues a token pair immediately, but the account still
    /// requires email activation before first login, so nothing is
    /// persisted here; the caller decides what to do with the pair.
    pub async fn register(&self, request: RegisterRequest) -> Result<TokenPair, ClientError> {
        let request = self
            .request(reqwest::Method::POST, "/register/")
            .json(&request);
        self.execute_public(request).await
    }

    /// Check whether an album number is well-formed and unused
    pub async fn verify_album_number(
        &self,
        album_number: &str,
    ) -> Result<AlbumVerification, ClientError> {
        let request = self
            .request(reqwest::Method::POST, "/verify-album-number/")
            .json(&json!({ "album_number": album_number }));
        self.execute_public(request).await
    }

    /// Execute a request outside the session layer
    async fn execute_public<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let response = Self::into_result(response).await?;
        Ok(response.json().await?)
    }
}
