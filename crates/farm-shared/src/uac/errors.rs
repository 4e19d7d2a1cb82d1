use reqwest::StatusCode;

use crate::errors::ConversionError;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid Email Or Password")]
    InvalidEmailOrPassword,
    #[error("Email Already Exists")]
    EmailAlreadyExists,
    #[error("Invalid input: {0}")]
    Validation(#[from] ConversionError),
    #[error("Unexpected Error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl AuthError {
    /// Returns `true` if the auth error is [`EmailAlreadyExists`].
    ///
    /// [`EmailAlreadyExists`]: AuthError::EmailAlreadyExists
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::EmailAlreadyExists)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ResetPasswordError {
    #[error("Invalid Reset Link")]
    MissingToken,
    #[error("Invalid input: {0}")]
    Validation(#[from] ConversionError),
    #[error("Unexpected Error")]
    UnexpectedError(#[from] anyhow::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Session expired. Please login again.")]
    SessionExpired,
    #[error("{detail}")]
    RequestFailed { status: StatusCode, detail: String },
    #[error("Unexpected Error: {0:#}")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ApiError {
    /// Returns `true` if the api error is [`SessionExpired`].
    ///
    /// [`SessionExpired`]: ApiError::SessionExpired
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
