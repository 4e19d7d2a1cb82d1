use std::{path::PathBuf, time::Duration};

use farm_shared::const_config::client::{
    CLIENT_DEFAULT_API_URL, CLIENT_LOGIN_DELAY, CLIENT_RESET_DELAY, CLIENT_SIGNUP_DELAY,
};
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Where the session is cached between runs. Kept in memory only if not set
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    #[serde(default)]
    pub delays: SimulatedDelays,
}

/// Stand-in round trip times for the operations served by the local
/// credential directory
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulatedDelays {
    #[serde(
        default = "default_login_delay_ms",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub login_ms: u64,
    #[serde(
        default = "default_signup_delay_ms",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub signup_ms: u64,
    #[serde(
        default = "default_reset_delay_ms",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub reset_ms: u64,
}

impl SimulatedDelays {
    pub const NONE: Self = Self {
        login_ms: 0,
        signup_ms: 0,
        reset_ms: 0,
    };

    pub fn login(&self) -> Duration {
        Duration::from_millis(self.login_ms)
    }

    pub fn signup(&self) -> Duration {
        Duration::from_millis(self.signup_ms)
    }

    pub fn reset(&self) -> Duration {
        Duration::from_millis(self.reset_ms)
    }
}

impl Default for SimulatedDelays {
    fn default() -> Self {
        Self {
            login_ms: default_login_delay_ms(),
            signup_ms: default_signup_delay_ms(),
            reset_ms: default_reset_delay_ms(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            storage_dir: None,
            delays: Default::default(),
        }
    }
}

fn default_api_url() -> String {
    CLIENT_DEFAULT_API_URL.to_string()
}

fn default_login_delay_ms() -> u64 {
    duration_as_ms(CLIENT_LOGIN_DELAY)
}

fn default_signup_delay_ms() -> u64 {
    duration_as_ms(CLIENT_SIGNUP_DELAY)
}

fn default_reset_delay_ms() -> u64 {
    duration_as_ms(CLIENT_RESET_DELAY)
}

fn duration_as_ms(value: Duration) -> u64 {
    value.as_millis().try_into().unwrap_or(u64::MAX)
}

/// Layers the optional settings file under `APP_` prefixed environment
/// variables.
///
/// E.g. `APP_DELAYS__LOGIN_MS=0` would set `ClientConfig.delays.login_ms`
pub fn get_configuration(
    settings_file: Option<PathBuf>,
) -> Result<ClientConfig, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = settings_file {
        builder = builder.add_source(config::File::from(path).required(false));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<ClientConfig>()
}
