use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Per-category relay switches for inbound game events.
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub lifecycle: bool,
    pub presence: bool,
    pub chat: bool,
    pub deaths: bool,
    pub advancements: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    pub group_ids: Vec<String>,
    pub relay: RelayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub bridge: BridgeConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8765)?
            .set_default("server.path", "/ws")?
            .set_default("bridge.group_ids", Vec::<String>::new())?
            .set_default("bridge.relay.lifecycle", true)?
            .set_default("bridge.relay.presence", true)?
            .set_default("bridge.relay.chat", true)?
            .set_default("bridge.relay.deaths", true)?
            .set_default("bridge.relay.advancements", true)?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.path.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "server.path must start with '/', got: {}",
                self.server.path
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("environment", "test")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 0)?
            .set_default("server.path", "/ws")?
            .set_default("bridge.group_ids", vec!["100001".to_string()])?
            .set_default("bridge.relay.lifecycle", true)?
            .set_default("bridge.relay.presence", true)?
            .set_default("bridge.relay.chat", true)?
            .set_default("bridge.relay.deaths", true)?
            .set_default("bridge.relay.advancements", true)?
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}
