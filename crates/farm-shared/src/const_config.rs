//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

pub mod client {
    use std::time::Duration;

    pub const CLIENT_DEFAULT_API_URL: &str = "http://localhost:8000/api";
    /// Simulated round trip for a login against the credential directory
    pub const CLIENT_LOGIN_DELAY: Duration = Duration::from_millis(1000);
    pub const CLIENT_SIGNUP_DELAY: Duration = Duration::from_millis(1500);
    pub const CLIENT_RESET_DELAY: Duration = Duration::from_millis(1000);
}

/// Keys used to persist the session on the client
pub mod storage {
    pub const STORAGE_KEY_USER: &str = "user";
    pub const STORAGE_KEY_ACCESS_TOKEN: &str = "token";
    pub const STORAGE_KEY_REFRESH_TOKEN: &str = "refreshToken";
}

/// Dashboard pages the UI is sent to after session changes
pub mod route {
    pub const ROUTE_DASHBOARD: &str = "/dashboard";
    pub const ROUTE_LOGIN: &str = "/login";
}

pub mod section {
    pub const SECTION_DASHBOARD: &str = "dashboard";
    pub const SECTION_LIVESTOCK: &str = "livestock";
    pub const SECTION_BREEDING: &str = "breeding";
    pub const SECTION_FEEDING: &str = "feeding";
    pub const SECTION_FINANCES: &str = "finances";
    pub const SECTION_REPORTS: &str = "reports";
    pub const SECTION_SETTINGS: &str = "settings";
    pub const SECTION_USERS: &str = "users";
}

pub mod action {
    pub const ACTION_VIEW: &str = "view";
    pub const ACTION_CREATE: &str = "create";
    pub const ACTION_UPDATE: &str = "update";
    pub const ACTION_DELETE: &str = "delete";
    pub const ACTION_GENERATE: &str = "generate";
    pub const ACTION_EXPORT: &str = "export";
}

pub mod validation {
    pub const VALIDATION_PASSWORD_MIN_LENGTH: usize = 6;
}

pub mod path {
    mod path_spec;
    pub use path_spec::PathSpec;
    pub const PATH_HEALTH_CHECK: PathSpec = PathSpec::get("/health-check/");
    pub const PATH_TOKEN_REFRESH: PathSpec = PathSpec::post("/token/refresh/");
}
