use secrecy::{ExposeSecret as _, SecretString};
use std::fmt::Debug;

/// Bearer and refresh token as handed out by the backend's token endpoints
#[derive(serde::Deserialize, Clone)]
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl TokenPair {
    pub fn new<S: Into<String>>(access: S, refresh: S) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: SecretString::from(refresh.into()),
        }
    }
}

/// Value for the `Authorization` header
pub fn bearer_header_value(access: &SecretString) -> String {
    format!("Bearer {}", access.expose_secret())
}

impl Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("has_access", &!self.access.expose_secret().is_empty())
            .field("has_refresh", &!self.refresh.expose_secret().is_empty())
            .finish()
    }
}
