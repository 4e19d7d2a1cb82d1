use thiserror::Error;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Empty not allowed")]
    Empty,
    #[error("Maximum length exceeded. {max} allowed but found {actual}")]
    MaxExceeded { max: usize, actual: usize },
    #[error("Minimum length not met. {min} required but found {actual}")]
    MinNotMet { min: usize, actual: usize },
    #[error("Please Enter A Valid Email Address")]
    InvalidEmail,
    #[error("Unknown role '{0}'")]
    UnknownRole(String),
}

#[derive(Debug, Error)]
#[error("The user has not logged in")]
pub struct NotLoggedInError;
