use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::device_flow::{ConsolePrompt, DeviceAuthorizationClient, InteractionMode, LoginPrompt};
use crate::error::AuthError;
use crate::refresh::AccessTokenRefresher;
use crate::store::CredentialStore;

/// Session orchestrator: the single entry point collaborators use to obtain
/// a valid bearer token before issuing an API request.
///
/// Decides, from the current store state, whether to reuse the cached access
/// token, silently refresh it, or run the full device-authorization flow.
/// Concurrent callers sharing one `AuthService` are serialized through a
/// single-flight lock, so at most one refresh/login sequence runs at a time.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use copilot_auth::{AuthService, FileCredentialStore};
///
/// # async fn example() -> Result<(), copilot_auth::AuthError> {
/// let store = Arc::new(FileCredentialStore::new_default());
/// let service = AuthService::new(store);
/// let access_token = service.obtain_access_token().await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    device_flow: DeviceAuthorizationClient,
    refresher: AccessTokenRefresher,
    mode: InteractionMode,
    prompt: Arc<dyn LoginPrompt>,
    cancel: CancellationToken,
    flight: Mutex<()>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            device_flow: DeviceAuthorizationClient::new(),
            refresher: AccessTokenRefresher::new(),
            mode: InteractionMode::Poll,
            prompt: Arc::new(ConsolePrompt),
            cancel: CancellationToken::new(),
            flight: Mutex::new(()),
        }
    }

    pub fn with_device_flow(mut self, client: DeviceAuthorizationClient) -> Self {
        self.device_flow = client;
        self
    }

    pub fn with_refresher(mut self, refresher: AccessTokenRefresher) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn with_interaction_mode(mut self, mode: InteractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn LoginPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Return a currently valid access token, refreshing or re-authenticating
    /// as needed.
    ///
    /// Fast path: a cached, unexpired token is returned without any network
    /// call. Otherwise, a stored identity token is used for a silent refresh;
    /// only if the provider rejects that identity token does the full
    /// interactive device-authorization flow run. Any other refresh error
    /// propagates unchanged.
    pub async fn obtain_access_token(&self) -> Result<String, AuthError> {
        if let Some(credential) = self.store.load()? {
            if !self.store.is_expired(&credential) {
                return Ok(credential.access_token);
            }
        }

        let _flight = self.flight.lock().await;
        // A concurrent caller may have refreshed while we waited on the lock.
        let cached = self.store.load()?;
        if let Some(credential) = &cached {
            if !self.store.is_expired(credential) {
                return Ok(credential.access_token.clone());
            }
        }

        if let Some(credential) = &cached {
            if !credential.identity_token.is_empty() {
                match self
                    .refresher
                    .refresh(&credential.identity_token, self.store.as_ref())
                    .await
                {
                    Ok(access_token) => return Ok(access_token),
                    Err(AuthError::IdentityTokenInvalid) => {
                        debug!("stored identity token rejected; running device authorization");
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        let identity_token = self
            .device_flow
            .authorize(&self.mode, self.prompt.as_ref(), &self.cancel)
            .await?;
        self.refresher
            .refresh(&identity_token, self.store.as_ref())
            .await
    }

    /// Remove stored credentials. The next `obtain_access_token` call will
    /// re-authenticate from scratch.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()
    }

    /// Whether a usable session exists: either a currently valid access token
    /// or a recoverable identity token. Never performs a network call and
    /// never triggers interactive login.
    pub fn is_authenticated(&self) -> bool {
        match self.store.load() {
            Ok(Some(credential)) => {
                !self.store.is_expired(&credential) || !credential.identity_token.is_empty()
            }
            _ => false,
        }
    }
}
