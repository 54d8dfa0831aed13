//! StudyTailor HTTP client

pub mod assistant;
pub mod auth;
pub mod materials;
mod session;
pub mod subjects;

use crate::error::ClientError;
use reqwest::{Client, ClientBuilder, Response};
use session::RefreshGate;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studytailor_core::storage::MemoryTokenStore;
use studytailor_core::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore};
use tracing::info;

type SessionExpiredHandler = Box<dyn Fn() + Send + Sync>;

/// Default proactive-refresh window before token expiry
const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(60);

/// StudyTailor API client
///
/// Owns the whole credential lifecycle: it attaches the stored access token
/// to outgoing requests, refreshes it proactively when it is about to expire
/// and reactively when the backend rejects it, and coordinates concurrent
/// failures so that at most one refresh call is ever in flight.
#[derive(Clone)]
pub struct StudyTailorClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    refresh_threshold: Duration,
    gate: Mutex<RefreshGate>,
    expired_handler: Mutex<Option<SessionExpiredHandler>>,
}

impl StudyTailorClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> StudyTailorClientBuilder {
        StudyTailorClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Create a request builder for a backend endpoint
    ///
    /// The bearer credential is attached later, by [`execute`](Self::execute),
    /// so that a refreshed token can be picked up between attempts.
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.inner.base_url, path);
        self.inner.http.request(method, url)
    }

    /// Execute a request with session recovery and decode the JSON response
    ///
    /// Guarantees of the session layer: the request carries a valid bearer
    /// credential when one can be obtained; a rejected credential is healed
    /// through the refresh endpoint and the request is replayed exactly once;
    /// non-authentication errors are surfaced unchanged.
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send_with_session(request).await?;
        Ok(response.json().await?)
    }

    /// Execute a request with session recovery and return the raw body
    pub async fn execute_raw(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<bytes::Bytes, ClientError> {
        let response = self.send_with_session(request).await?;
        Ok(response.bytes().await?)
    }

    /// Execute a request with session recovery, discarding the response body
    pub async fn execute_empty(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(), ClientError> {
        self.send_with_session(request).await?;
        Ok(())
    }

    /// Persist a freshly issued token pair and mark the session authenticated
    pub async fn login(&self, access: &str, refresh: &str) -> Result<(), ClientError> {
        self.inner.store.set(ACCESS_TOKEN_KEY, access).await?;
        self.inner.store.set(REFRESH_TOKEN_KEY, refresh).await?;
        info!("Session authenticated");
        Ok(())
    }

    /// Erase the persisted session; safe to call when already logged out
    pub async fn logout(&self) {
        self.clear_session().await;
        info!("Session cleared");
    }

    /// Check whether an access token is currently persisted
    pub async fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.inner.store.get(ACCESS_TOKEN_KEY).await?.is_some())
    }

    /// Register the handler fired when the session is irrecoverably lost
    ///
    /// The application typically navigates to its unauthenticated entry
    /// route here. The handler fires on every terminal auth failure.
    pub fn on_session_expired(&self, handler: impl Fn() + Send + Sync + 'static) {
        let mut slot = self
            .inner
            .expired_handler
            .lock()
            .expect("session handler lock poisoned");
        *slot = Some(Box::new(handler));
    }

    /// Remove the session-expired handler
    pub fn clear_session_expired_handler(&self) {
        let mut slot = self
            .inner
            .expired_handler
            .lock()
            .expect("session handler lock poisoned");
        *slot = None;
    }

    pub(crate) fn notify_session_expired(&self) {
        let slot = self
            .inner
            .expired_handler
            .lock()
            .expect("session handler lock poisoned");
        if let Some(handler) = slot.as_ref() {
            handler();
        }
    }

    /// Map a settled response to a success or a status-classified error
    pub(crate) async fn into_result(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }
}

/// Builder for [`StudyTailorClient`]
pub struct StudyTailorClientBuilder {
    base_url: Option<String>,
    store: Option<Arc<dyn TokenStore>>,
    refresh_threshold: Duration,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl Default for StudyTailorClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            store: None,
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            timeout: None,
            user_agent: None,
        }
    }
}

impl StudyTailorClientBuilder {
    /// Set the backend base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the persisted token store
    ///
    /// Defaults to an in-memory store, which does not survive the process.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set how long before expiry a token is refreshed proactively
    pub fn refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    /// Set the request timeout
    ///
    /// Also bounds the refresh call; a refresh timeout is handled like a
    /// refresh rejection.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<StudyTailorClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder.user_agent("studytailor-client/0.1.0");
        }

        let http = client_builder.build()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));

        Ok(StudyTailorClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                store,
                refresh_threshold: self.refresh_threshold,
                gate: Mutex::new(RefreshGate::new()),
                expired_handler: Mutex::new(None),
            }),
        })
    }
}
