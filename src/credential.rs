use serde::{Deserialize, Serialize};

/// Persisted credential tuple, written and replaced as one unit.
///
/// The identity token is the long-lived GitHub OAuth token obtained through
/// the device flow; it is only ever used to mint short-lived Copilot access
/// tokens. An empty `identity_token` means no refresh path exists, so the
/// access fields are unusable once expired.
///
/// # Example
/// ```
/// use copilot_auth::StoredCredential;
///
/// let credential = StoredCredential {
///     identity_token: "gho_abc".to_string(),
///     access_token: "copilot-token".to_string(),
///     access_token_expires_at: 1_900_000_000,
/// };
/// assert!(!credential.identity_token.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub identity_token: String,
    pub access_token: String,
    /// Unix seconds.
    pub access_token_expires_at: i64,
}
