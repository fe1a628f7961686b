use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct TelegramSettings {
    pub token: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AuthSettings {
    pub base_url: String,
    pub api_token: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WebAppSettings {
    pub url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub backend: BackendSettings,
    pub auth: AuthSettings,
    pub webapp: WebAppSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
