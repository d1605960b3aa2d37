use std::sync::OnceLock;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::queue::QueueConfig;

#[derive(Deserialize, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct QueueSettings {
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_secs: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            max_attempts: 3,
            retry_backoff_secs: 30,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct NotifierSettings {
    pub mode: String,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            mode: "log".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
}

impl AppSettings {
    fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

impl From<&QueueSettings> for QueueConfig {
    fn from(value: &QueueSettings) -> Self {
        Self {
            poll_interval: Duration::from_secs(value.poll_interval_secs),
            max_attempts: value.max_attempts,
            retry_backoff: Duration::from_secs(value.retry_backoff_secs),
        }
    }
}

pub fn get() -> &'static AppSettings {
    static APPSETTINGS: OnceLock<AppSettings> = OnceLock::new();
    APPSETTINGS.get_or_init(|| AppSettings::new().expect("Application settings are invalid."))
}
