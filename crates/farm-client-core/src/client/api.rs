use farm_shared::{const_config::path::PATH_HEALTH_CHECK, uac::ApiError};
use futures::channel::oneshot;

use crate::{client::UiCallBack, ApiClient};

/// Body returned by the backend's health check endpoint
#[derive(Debug, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub version: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

impl ApiClient {
    #[tracing::instrument(skip(ui_notify))]
    pub fn health_check<F>(&self, ui_notify: F) -> oneshot::Receiver<Result<HealthStatus, ApiError>>
    where
        F: UiCallBack,
    {
        self.send_request_expect_json(PATH_HEALTH_CHECK, &(), ui_notify)
    }
}
