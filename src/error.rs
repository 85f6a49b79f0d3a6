use thiserror::Error;

/// Normalized authentication errors for the device-flow core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The user explicitly declined the device authorization request.
    #[error("GitHub authorization was denied by the user")]
    Denied,
    /// The device code expired before the user approved the request.
    #[error("Device authorization timed out; restart the login flow")]
    Timeout,
    /// An external cancellation signal aborted the flow mid-wait.
    #[error("Device authorization was cancelled")]
    Cancelled,
    /// The stored identity token is no longer accepted by the provider.
    #[error("Stored identity token is no longer valid; re-authentication required")]
    IdentityTokenInvalid,
    /// Valid identity, but the account lacks Copilot entitlement.
    #[error("Access forbidden; an active GitHub Copilot subscription is required")]
    AccessForbidden,
    /// Unexpected HTTP status or malformed response from the provider.
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// Optional SDK tooling is missing from the environment.
    #[error("SDK unavailable: {0}")]
    SdkUnavailable(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Stable machine-readable code for each error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Denied => "AUTH_DENIED",
            Self::Timeout => "AUTH_TIMEOUT",
            Self::Cancelled => "AUTH_CANCELLED",
            Self::IdentityTokenInvalid => "IDENTITY_TOKEN_INVALID",
            Self::AccessForbidden => "ACCESS_FORBIDDEN",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::SdkUnavailable(_) => "SDK_UNAVAILABLE",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
