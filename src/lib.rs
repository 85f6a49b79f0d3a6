//! GitHub Copilot device-authorization flow and bearer-token lifecycle.
//!
//! Authenticates a local process against the Copilot API with the OAuth 2.0
//! device-authorization flow, then maintains a renewable short-lived access
//! token backed by a persisted credential cache. Collaborators interact with
//! the core through [`AuthService`]: obtain a valid bearer token, check
//! session status, or invalidate stored credentials.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use copilot_auth::{AuthService, FileCredentialStore};
//!
//! # async fn example() -> Result<(), copilot_auth::AuthError> {
//! let store = Arc::new(FileCredentialStore::new_default());
//! let service = AuthService::new(store);
//! // First call prompts for device login; later calls reuse the cache.
//! let access_token = service.obtain_access_token().await?;
//! # Ok(())
//! # }
//! ```

pub mod credential;
pub mod device_flow;
pub mod error;
pub mod refresh;
pub mod session;
pub mod store;

pub use credential::StoredCredential;
pub use device_flow::{
    ApprovalGate, ConsolePrompt, DeviceAuthorizationClient, DeviceAuthorizationSession,
    InteractionMode, LoginPrompt, PollOutcome,
};
pub use error::AuthError;
pub use refresh::AccessTokenRefresher;
pub use session::AuthService;
pub use store::{default_credential_path, CredentialStore, FileCredentialStore};
