//! Stores the session and access control functionality shared by the
//! dashboard clients
//! NB: The assumption is made that the async runtime has already been started
//! before any async functions from this library are called

#![warn(unused_crate_dependencies)]


mod client;
pub mod config;
mod directory;
mod guard;
mod session;
pub mod storage;

pub use client::{api::HealthStatus, ApiClient, UiCallBack};
pub use config::{get_configuration, ClientConfig, SimulatedDelays};
pub use directory::UserDirectory;
pub use guard::{GuardDecision, RoleGuard};
pub use session::{AuthContext, SessionState};
