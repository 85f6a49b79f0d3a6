#![allow(dead_code)]

use std::sync::Mutex;

use chrono::Utc;
use copilot_auth::{AuthError, CredentialStore, LoginPrompt, StoredCredential};

/// In-memory credential store for tests.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credential: Mutex<Option<StoredCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, credential: StoredCredential) {
        *self.credential.lock().expect("store lock poisoned") = Some(credential);
    }

    pub fn get(&self) -> Option<StoredCredential> {
        self.credential.lock().expect("store lock poisoned").clone()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<StoredCredential>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, credential: &StoredCredential) -> Result<(), AuthError> {
        self.seed(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.credential.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Prompt that records every time it is shown.
#[derive(Default)]
pub struct RecordingPrompt {
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().expect("prompt lock poisoned").clone()
    }
}

impl LoginPrompt for RecordingPrompt {
    fn show(&self, verification_uri: &str, user_code: &str) {
        self.shown
            .lock()
            .expect("prompt lock poisoned")
            .push((verification_uri.to_string(), user_code.to_string()));
    }
}

pub fn fresh_credential(identity_token: &str, access_token: &str) -> StoredCredential {
    StoredCredential {
        identity_token: identity_token.to_string(),
        access_token: access_token.to_string(),
        access_token_expires_at: Utc::now().timestamp() + 3600,
    }
}

pub fn expired_credential(identity_token: &str, access_token: &str) -> StoredCredential {
    StoredCredential {
        identity_token: identity_token.to_string(),
        access_token: access_token.to_string(),
        access_token_expires_at: Utc::now().timestamp() - 60,
    }
}
