use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::AuthError;

const DEFAULT_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";
const DEFAULT_SCOPE: &str = "read:user";
const DEFAULT_DEVICE_CODE_URL: &str = "https://github.com/login/device/code";
const DEFAULT_ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Device-authorization session details for one login attempt.
///
/// Ephemeral: discarded once the identity token is obtained or the attempt
/// fails. `expires_at` is the absolute deadline computed from the provider's
/// `expires_in`.
#[derive(Debug, Clone)]
pub struct DeviceAuthorizationSession {
    pub verification_uri: String,
    pub user_code: String,
    pub device_code: String,
    pub interval_secs: u64,
    pub expires_at: DateTime<Utc>,
}

/// Classification of a single token-endpoint response.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// `authorization_pending`: wait one interval and query again.
    Pending,
    /// `slow_down`: wait two intervals before the next query.
    SlowDown,
    /// User approved; the identity token is ready.
    Authorized { identity_token: String },
    /// `access_denied`: the user declined.
    Denied,
    /// `expired_token`, or the absolute deadline already passed.
    Expired,
}

/// Signal source for manual-confirmation mode: each resolution permits one
/// token-endpoint query.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn confirmed(&self) -> Result<(), AuthError>;
}

/// How the client waits between token-endpoint queries.
///
/// Both modes honor the same absolute deadline and error classification.
#[derive(Clone)]
pub enum InteractionMode {
    /// Autonomous polling: sleep the provider-issued interval, then query.
    Poll,
    /// Block on an external confirmation signal before each query.
    Manual(Arc<dyn ApprovalGate>),
}

impl fmt::Debug for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll => f.write_str("Poll"),
            Self::Manual(_) => f.write_str("Manual"),
        }
    }
}

/// Displays the verification URL and user code to the person approving the
/// request. Invoked exactly once per login attempt.
pub trait LoginPrompt: Send + Sync {
    fn show(&self, verification_uri: &str, user_code: &str);
}

/// Default prompt printing the login instructions to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl LoginPrompt for ConsolePrompt {
    fn show(&self, verification_uri: &str, user_code: &str) {
        eprintln!();
        eprintln!("GitHub Copilot login required");
        eprintln!("  1. Visit: {verification_uri}");
        eprintln!("  2. Enter code: {user_code}");
        eprintln!();
        eprintln!("Waiting for authorization...");
    }
}

/// OAuth device-authorization client for the GitHub identity provider.
///
/// Drives `REQUESTING_CODE -> AWAITING_APPROVAL -> DONE` via [`Self::start`],
/// [`Self::poll_once`], and the [`Self::authorize`] loop.
///
/// # Example
/// ```no_run
/// use copilot_auth::{ConsolePrompt, DeviceAuthorizationClient, InteractionMode};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), copilot_auth::AuthError> {
/// let client = DeviceAuthorizationClient::new();
/// let identity_token = client
///     .authorize(&InteractionMode::Poll, &ConsolePrompt, &CancellationToken::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceAuthorizationClient {
    client: reqwest::Client,
    client_id: String,
    scope: String,
    device_code_url: String,
    access_token_url: String,
}

impl Default for DeviceAuthorizationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAuthorizationClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            device_code_url: DEFAULT_DEVICE_CODE_URL.to_string(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_string(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_device_code_url(mut self, url: impl Into<String>) -> Self {
        self.device_code_url = url.into();
        self
    }

    pub fn with_access_token_url(mut self, url: impl Into<String>) -> Self {
        self.access_token_url = url.into();
        self
    }

    /// Request a device code and user code from the provider.
    pub async fn start(&self) -> Result<DeviceAuthorizationSession, AuthError> {
        let resp = self
            .client
            .post(&self.device_code_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::Protocol(format!(
                "device code request failed with status {}",
                resp.status()
            )));
        }
        let payload: DeviceCodeResponse = resp
            .json()
            .await
            .map_err(|err| AuthError::Protocol(format!("malformed device code response: {err}")))?;
        let expires_at = Utc::now() + chrono::Duration::seconds(payload.expires_in as i64);
        debug!(
            interval_secs = payload.interval,
            expires_in = payload.expires_in,
            "device flow: code issued"
        );
        Ok(DeviceAuthorizationSession {
            verification_uri: payload.verification_uri,
            user_code: payload.user_code,
            device_code: payload.device_code,
            interval_secs: payload.interval,
            expires_at,
        })
    }

    /// Query the token endpoint once and classify the response.
    ///
    /// Non-2xx responses are protocol errors, never "not yet approved".
    pub async fn poll_once(
        &self,
        session: &DeviceAuthorizationSession,
    ) -> Result<PollOutcome, AuthError> {
        if Utc::now() >= session.expires_at {
            return Ok(PollOutcome::Expired);
        }
        let resp = self
            .client
            .post(&self.access_token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("device_code", session.device_code.as_str()),
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::Protocol(format!(
                "device token request failed with status {}",
                resp.status()
            )));
        }
        let payload: TokenPollResponse = resp
            .json()
            .await
            .map_err(|err| AuthError::Protocol(format!("malformed token response: {err}")))?;
        if let Some(identity_token) = payload.access_token {
            return Ok(PollOutcome::Authorized { identity_token });
        }
        match payload.error.as_deref() {
            Some("authorization_pending") => Ok(PollOutcome::Pending),
            Some("slow_down") => Ok(PollOutcome::SlowDown),
            Some("access_denied") => Ok(PollOutcome::Denied),
            Some("expired_token") => Ok(PollOutcome::Expired),
            Some(other) => Err(AuthError::Protocol(match payload.error_description {
                Some(description) => format!("{other}: {description}"),
                None => other.to_string(),
            })),
            None => Err(AuthError::Protocol(
                "token response missing both access_token and error".to_string(),
            )),
        }
    }

    /// Run the full device-authorization flow to completion.
    ///
    /// Shows the verification URL and user code once, then repeats
    /// wait -> query until the user approves, declines, the deadline elapses,
    /// or `cancel` fires. Cancellation surfaces as [`AuthError::Cancelled`],
    /// distinct from [`AuthError::Timeout`].
    pub async fn authorize(
        &self,
        mode: &InteractionMode,
        prompt: &dyn LoginPrompt,
        cancel: &CancellationToken,
    ) -> Result<String, AuthError> {
        let session = self.start().await?;
        prompt.show(&session.verification_uri, &session.user_code);
        info!(user_code = %session.user_code, "device flow: awaiting user approval");

        let mut wait = Duration::from_secs(session.interval_secs);
        loop {
            self.wait_for_next_query(mode, wait, session.expires_at, cancel)
                .await?;
            match self.poll_once(&session).await? {
                PollOutcome::Authorized { identity_token } => {
                    info!("device flow: authorized");
                    return Ok(identity_token);
                }
                PollOutcome::Denied => return Err(AuthError::Denied),
                PollOutcome::Expired => return Err(AuthError::Timeout),
                outcome @ (PollOutcome::Pending | PollOutcome::SlowDown) => {
                    wait = wait_before_next_poll(session.interval_secs, &outcome);
                    debug!(wait_secs = wait.as_secs(), "device flow: pending");
                }
            }
        }
    }

    /// Suspend until the next query is allowed, bounded by the absolute
    /// deadline and the cancellation token.
    async fn wait_for_next_query(
        &self,
        mode: &InteractionMode,
        wait: Duration,
        deadline: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<(), AuthError> {
        let remaining = (deadline - Utc::now())
            .to_std()
            .map_err(|_| AuthError::Timeout)?;
        match mode {
            InteractionMode::Poll => {
                let sleep_for = wait.min(remaining);
                tokio::select! {
                    _ = cancel.cancelled() => Err(AuthError::Cancelled),
                    _ = tokio::time::sleep(sleep_for) => {
                        if sleep_for < wait {
                            // Deadline lands before the next permitted query.
                            Err(AuthError::Timeout)
                        } else {
                            Ok(())
                        }
                    }
                }
            }
            InteractionMode::Manual(gate) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(AuthError::Cancelled),
                    _ = tokio::time::sleep(remaining) => Err(AuthError::Timeout),
                    confirmed = gate.confirmed() => confirmed,
                }
            }
        }
    }
}

/// Delay before the next query: one interval normally, two after `slow_down`.
fn wait_before_next_poll(interval_secs: u64, outcome: &PollOutcome) -> Duration {
    match outcome {
        PollOutcome::SlowDown => Duration::from_secs(interval_secs * 2),
        _ => Duration::from_secs(interval_secs),
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    interval: u64,
}

#[derive(Debug, Deserialize)]
struct TokenPollResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}
