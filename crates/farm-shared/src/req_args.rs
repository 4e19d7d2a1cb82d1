//! Arguments for the session operations. Passwords are kept as
//! [`SecretString`] so they stay out of logs

use crate::uac::Role;
use secrecy::{ExposeSecret, SecretString};
use std::fmt::Debug;

#[derive(serde::Deserialize, Clone)]
pub struct LoginReqArgs {
    pub email: String,
    pub password: SecretString,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(email: S, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct SignupReqArgs {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    #[serde(default)]
    pub role: Role,
}

impl SignupReqArgs {
    /// Uses the [`Role::Standard`] role
    pub fn new<S: Into<String>>(name: S, email: S, password: SecretString) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password,
            role: Role::default(),
        }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct ResetPasswordReqArgs {
    pub token: SecretString,
    pub new_password: SecretString,
}

impl ResetPasswordReqArgs {
    pub fn new(token: SecretString, new_password: SecretString) -> Self {
        Self {
            token,
            new_password,
        }
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

impl Debug for SignupReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupReqArgs")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .field("role", &self.role)
            .finish()
    }
}

impl Debug for ResetPasswordReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordReqArgs")
            .field("has_token", &!self.token.expose_secret().is_empty())
            .field(
                "has_new_password",
                &!self.new_password.expose_secret().is_empty(),
            )
            .finish()
    }
}
