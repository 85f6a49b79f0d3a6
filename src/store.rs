use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::credential::StoredCredential;
use crate::error::AuthError;

/// Safety margin against clock drift and in-flight request latency: a token
/// entering its last five minutes is treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 5 * 60;

/// Storage abstraction for the persisted credential record.
///
/// Implementations own the backing resource exclusively; callers receive
/// loaded snapshots by value and submit whole-record replacement writes.
pub trait CredentialStore: Send + Sync {
    /// Load the stored credential. Missing or corrupt storage is treated
    /// identically to "no credential": both yield `Ok(None)`.
    fn load(&self) -> Result<Option<StoredCredential>, AuthError>;

    /// Replace the stored record in full, creating missing parent
    /// directories. No reader ever observes a half-written record.
    fn save(&self, credential: &StoredCredential) -> Result<(), AuthError>;

    /// Remove the stored record. Removing an absent record is not an error.
    fn clear(&self) -> Result<(), AuthError>;

    /// True when the access token expires less than five minutes from now.
    /// A token expiring exactly five minutes from now is not yet expired.
    fn is_expired(&self, credential: &StoredCredential) -> bool {
        is_expired_at(credential, Utc::now().timestamp())
    }
}

fn is_expired_at(credential: &StoredCredential, now_secs: i64) -> bool {
    credential.access_token_expires_at < now_secs + EXPIRY_SKEW_SECS
}

/// Default credential file path: `<user config dir>/copilot-auth/auth.json`.
pub fn default_credential_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("copilot-auth").join("auth.json"))
        .unwrap_or_else(|| PathBuf::from(".copilot-auth").join("auth.json"))
}

/// File-backed credential store holding a single JSON document.
///
/// # Example
/// ```no_run
/// use copilot_auth::{CredentialStore, FileCredentialStore, StoredCredential};
///
/// let store = FileCredentialStore::new(copilot_auth::default_credential_path());
/// let credential = StoredCredential {
///     identity_token: "gho_abc".to_string(),
///     access_token: "copilot-token".to_string(),
///     access_token_expires_at: 1_900_000_000,
/// };
/// store.save(&credential)?;
/// # Ok::<(), copilot_auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self {
            path: default_credential_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<StoredCredential>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        // Undecodable contents count as "no credential" rather than an error.
        Ok(serde_json::from_str(&raw).ok())
    }

    fn save(&self, credential: &StoredCredential) -> Result<(), AuthError> {
        Self::ensure_parent(&self.path)?;
        let serialized = serde_json::to_string_pretty(credential)?;
        // Write-then-rename so readers only ever see a complete record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}
