//! Shared items related to user account control

mod errors;
mod permissions;
mod role;
mod user;

pub use errors::{ApiError, AuthError, ResetPasswordError};
pub use permissions::{
    default_permission_table, init_permission_table_to_defaults, permission_table,
    permissions_for_role, try_set_permission_table, PermissionTable, Permissions,
};
pub use role::Role;
pub use user::{validate_new_password, DisplayName, Email, UserId, UserInfo};
