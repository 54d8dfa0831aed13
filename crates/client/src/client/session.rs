//! Session recovery and refresh coordination
//!
//! Many requests can be in flight when a credential expires; every one of
//! them discovers the same rejection at roughly the same time. The refresh
//! gate below guarantees that exactly one of them performs the refresh call
//! while the rest queue for its outcome, so a single-use refresh token is
//! never spent twice.

use super::StudyTailorClient;
use crate::claims;
use crate::error::ClientError;
use crate::types::{RefreshRequest, RefreshResponse};
use reqwest::{RequestBuilder, Response, StatusCode};
use studytailor_core::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Outcome delivered to queued requests when a refresh settles
///
/// The error side is a `String` so one failure can be cloned to every waiter.
type RefreshOutcome = Result<String, String>;

/// Single-flight latch plus the queue of requests awaiting the refresh
pub(super) struct RefreshGate {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

impl RefreshGate {
    pub(super) fn new() -> Self {
        Self {
            refreshing: false,
            waiters: Vec::new(),
        }
    }
}

impl StudyTailorClient {
    /// Send a request under session management
    ///
    /// Attaches the current access token (refreshing it first when it is
    /// about to expire), sends, and on a 401 heals the session and replays
    /// the request exactly once with the new credential.
    pub(crate) async fn send_with_session(
        &self,
        request: RequestBuilder,
    ) -> Result<Response, ClientError> {
        let replay = request.try_clone();
        self.send_with_replay(request, replay).await
    }

    /// Variant of [`send_with_session`](Self::send_with_session) with an
    /// explicit replay request, for bodies `try_clone` cannot copy
    /// (multipart uploads).
    pub(crate) async fn send_with_replay(
        &self,
        request: RequestBuilder,
        replay: Option<RequestBuilder>,
    ) -> Result<Response, ClientError> {
        let request = match self.current_access_token().await? {
            Some(token) => request.bearer_auth(token),
            // not logged in; the backend will answer 401 and the refresh
            // path decides whether the session is recoverable
            None => request,
        };

        let response = request.send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::into_result(response).await;
        }

        let rejection = response.text().await.unwrap_or_default();
        debug!(message = %rejection, "Request rejected with 401, attempting session recovery");

        let token = self.refresh_access_token().await?;

        let Some(replay) = replay else {
            // the body was a stream and cannot be rebuilt here
            return Err(ClientError::AuthenticationFailed(rejection));
        };

        // A 401 on the replay maps to AuthenticationFailed below and never
        // re-enters recovery.
        let response = replay.bearer_auth(token).send().await?;
        Self::into_result(response).await
    }

    /// Load the stored access token, refreshing it first when it expires
    /// within the configured threshold
    ///
    /// An undecodable token counts as expired.
    async fn current_access_token(&self) -> Result<Option<String>, ClientError> {
        let Some(token) = self.inner.store.get(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp();
        if claims::expires_within(&token, self.inner.refresh_threshold, now) {
            debug!("Access token expires within threshold, refreshing before use");
            return self.refresh_access_token().await.map(Some);
        }

        Ok(Some(token))
    }

    /// Obtain a fresh access token, sharing one refresh call among all
    /// concurrent callers
    pub(crate) async fn refresh_access_token(&self) -> Result<String, ClientError> {
        // Check-and-set happens under a single lock acquisition with no
        // suspension in between; two tasks can never both become the leader.
        let waiter = {
            let mut gate = self.inner.gate.lock().expect("refresh gate lock poisoned");
            if gate.refreshing {
                let (tx, rx) = oneshot::channel();
                gate.waiters.push(tx);
                Some(rx)
            } else {
                gate.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("Refresh already in flight, queueing until it settles");
            return match rx.await {
                Ok(Ok(token)) => Ok(token),
                Ok(Err(message)) => Err(ClientError::SessionExpired(message)),
                Err(_) => Err(ClientError::SessionExpired("refresh was aborted".into())),
            };
        }

        let leader = RefreshLeader { client: self };
        let outcome = self.do_refresh().await;
        leader.settle(&outcome);

        if outcome.is_err() {
            self.notify_session_expired();
        }

        outcome.map_err(ClientError::SessionExpired)
    }

    /// Perform the refresh call and persist its result
    ///
    /// Every failure is terminal for the session: the persisted tokens are
    /// erased before the error is reported.
    async fn do_refresh(&self) -> RefreshOutcome {
        let refresh_token = match self.inner.store.get(REFRESH_TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("No refresh token available, session cannot be recovered");
                self.clear_session().await;
                return Err("no refresh token available".to_string());
            }
            Err(error) => return Err(format!("token storage error: {error}")),
        };

        // Deliberately sent without a bearer credential: authenticating the
        // refresh call with the expiring access token would just fail again.
        let result = self
            .inner
            .http
            .post(format!("{}/token/refresh/", self.inner.base_url))
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "Refresh request failed to reach the backend");
                self.clear_session().await;
                return Err(format!("refresh request failed: {error}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, message = %message, "Token refresh rejected");
            self.clear_session().await;
            return Err(format!("refresh rejected with status {status}: {message}"));
        }

        let body: RefreshResponse = match response.json().await {
            Ok(body) => body,
            Err(error) => {
                warn!(error = %error, "Refresh response could not be decoded");
                self.clear_session().await;
                return Err(format!("refresh response could not be decoded: {error}"));
            }
        };

        if let Err(error) = self.inner.store.set(ACCESS_TOKEN_KEY, &body.access).await {
            return Err(format!("token storage error: {error}"));
        }
        // The backend only includes a refresh token when it rotates them;
        // otherwise the stored one stays valid.
        if let Some(rotated) = &body.refresh {
            if let Err(error) = self.inner.store.set(REFRESH_TOKEN_KEY, rotated).await {
                return Err(format!("token storage error: {error}"));
            }
        }

        info!("Access token refreshed");
        Ok(body.access)
    }

    /// Remove both persisted tokens; absent keys are ignored
    pub(crate) async fn clear_session(&self) {
        if let Err(error) = self.inner.store.remove(ACCESS_TOKEN_KEY).await {
            warn!(error = %error, "Failed to remove access token");
        }
        if let Err(error) = self.inner.store.remove(REFRESH_TOKEN_KEY).await {
            warn!(error = %error, "Failed to remove refresh token");
        }
    }

    /// Clear the in-flight latch and deliver the outcome to every queued
    /// waiter, in enqueue order, exactly once
    fn settle_refresh(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut gate = self.inner.gate.lock().expect("refresh gate lock poisoned");
            gate.refreshing = false;
            std::mem::take(&mut gate.waiters)
        };

        match outcome {
            Ok(token) => {
                for waiter in waiters {
                    let _ = waiter.send(Ok(token.clone()));
                }
            }
            Err(message) => {
                for waiter in waiters {
                    let _ = waiter.send(Err(message.clone()));
                }
            }
        }
    }
}

/// Guard held by the task that owns the in-flight refresh
///
/// A cancelled leader must still release the latch and reject queued
/// waiters, or they would wait forever on a refresh that nobody finishes.
struct RefreshLeader<'a> {
    client: &'a StudyTailorClient,
}

impl RefreshLeader<'_> {
    fn settle(self, outcome: &RefreshOutcome) {
        self.client.settle_refresh(outcome);
        std::mem::forget(self);
    }
}

impl Drop for RefreshLeader<'_> {
    fn drop(&mut self) {
        self.client
            .settle_refresh(&Err("refresh was aborted".to_string()));
    }
}
