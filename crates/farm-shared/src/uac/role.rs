use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use crate::errors::ConversionError;

use super::{permissions_for_role, Permissions};

/// The closed set of roles a session can have
#[derive(
    Debug,
    Default,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Standard,
}

impl Role {
    /// Admins are implicitly granted every section and action
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The permissions a new account with this role is created with
    pub fn default_permissions(self) -> Option<Permissions> {
        permissions_for_role(self).cloned()
    }
}

impl TryFrom<&str> for Role {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::iter()
            .find(|role| role.as_ref().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ConversionError::UnknownRole(value.to_string()))
    }
}
