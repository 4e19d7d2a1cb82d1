use std::{borrow::Cow, fmt::Display};

use secrecy::{ExposeSecret as _, SecretString};

use crate::{const_config::validation::VALIDATION_PASSWORD_MIN_LENGTH, errors::ConversionError};

use super::{Permissions, Role};

#[derive(
    Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

/// An email address, also used as the login identifier.
///
/// Only a light shape check is done (`local@domain.tld` without whitespace).
/// Comparisons between identifiers should go through [`Email::matches`] as
/// they are case insensitive
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl UserId {
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl DisplayName {
    pub const MAX_LENGTH: usize = 255;
}

impl Email {
    pub const MAX_LENGTH: usize = 254;

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl TryFrom<String> for UserId {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ConversionError::Empty);
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for UserId {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ConversionError::Empty);
        }
        if value.len() > Self::MAX_LENGTH {
            return Err(ConversionError::MaxExceeded {
                max: Self::MAX_LENGTH,
                actual: value.len(),
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for DisplayName {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl TryFrom<String> for Email {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConversionError::Empty);
        }
        if value.len() > Self::MAX_LENGTH {
            return Err(ConversionError::MaxExceeded {
                max: Self::MAX_LENGTH,
                actual: value.len(),
            });
        }
        if !is_email_shaped(value) {
            return Err(ConversionError::InvalidEmail);
        }
        Ok(Self(value.to_string()))
    }
}

impl TryFrom<&str> for Email {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`
fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Checks a password chosen by a user (signup or reset). Existing passwords are
/// never checked against this
pub fn validate_new_password(password: &SecretString) -> Result<(), ConversionError> {
    let actual = password.expose_secret().chars().count();
    if actual == 0 {
        return Err(ConversionError::Empty);
    }
    if actual < VALIDATION_PASSWORD_MIN_LENGTH {
        return Err(ConversionError::MinNotMet {
            min: VALIDATION_PASSWORD_MIN_LENGTH,
            actual,
        });
    }
    Ok(())
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user stored in the session slot (and persisted as a flat JSON object)
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: UserId,
    pub name: DisplayName,
    pub email: Email,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}

impl UserInfo {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// The permissions stored on the user, or if none were stored those
    /// configured for the user's role.
    ///
    /// `None` means no restriction is configured at all
    pub fn effective_permissions(&self) -> Option<Cow<'_, Permissions>> {
        match &self.permissions {
            Some(permissions) => Some(Cow::Borrowed(permissions)),
            None => self.role.default_permissions().map(Cow::Owned),
        }
    }

    /// Admins see everything. Otherwise the section must be listed unless no
    /// restriction is configured for this user
    pub fn can_access_section(&self, section: &str) -> bool {
        if self.is_admin() {
            return true;
        }
        match self.effective_permissions() {
            Some(permissions) => permissions.includes_section(section),
            None => true,
        }
    }

    /// Without an `action` this is the same as [`Self::can_access_section`]
    pub fn has_permission(&self, section: &str, action: Option<&str>) -> bool {
        if self.is_admin() {
            return true;
        }
        let Some(action) = action else {
            return self.can_access_section(section);
        };
        match self.effective_permissions() {
            Some(permissions) => permissions.allows(section, action),
            None => true,
        }
    }
}
