#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod inventory_config;
mod provider_config;
mod sink_config;

use app_config::AppConfig;
pub use app_config::get_config_dir;
pub use args::Args;
use eyre::{
    eyre,
    Result,
};
pub use inventory_config::InventoryConfig;
pub use provider_config::{
    ProviderConfig,
    ProviderKind,
};
use serde::{
    Deserialize,
    Serialize,
};
pub use sink_config::{
    ClickHouseConfig,
    InfluxDbConfig,
    SinkConfig,
};
use std::{
    collections::HashSet,
    time::Duration,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    app_config: AppConfig,
    pub interval_seconds: u64,
    pub max_concurrency: usize,
    pub request_timeout_seconds: u64,
    pub inventory: InventoryConfig,
    pub sink: SinkConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

/// Prefix for environment overrides, e.g. `PLAYER_COUNT_INVENTORY__HOST`.
const ENV_PREFIX: &str = "PLAYER_COUNT";

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers the bundled defaults, `config.yaml` in the config directory, the file passed with
    /// `--config`, `PLAYER_COUNT_*` environment variables and finally the CLI arguments.
    pub fn new(args: &Args) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let user_config = config::File::from(config_dir.join("config.yaml"))
            .format(config::FileFormat::Yaml)
            .required(false);
        builder = builder.add_source(user_config);

        if let Some(path) = &args.config {
            debug!(?path, "Loading config file from args");
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .add_source(args.clone());

        builder.build()?.try_deserialize()
    }

    /// Missing required settings are the only reason the process refuses to start.
    pub fn validate(&self) -> Result<()> {
        if self.interval_seconds == 0 {
            return Err(eyre!("interval_seconds must be greater than zero"));
        }
        if self.max_concurrency == 0 {
            return Err(eyre!("max_concurrency must be greater than zero"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(eyre!("request_timeout_seconds must be greater than zero"));
        }

        let inventory = &self.inventory;
        for (key, value) in [
            ("inventory.host", &inventory.host),
            ("inventory.user", &inventory.user),
            ("inventory.database", &inventory.database),
        ] {
            if value.trim().is_empty() {
                return Err(eyre!("{key} is required"));
            }
        }

        match &self.sink {
            SinkConfig::Influxdb(influx) => {
                for (key, value) in [
                    ("sink.url", &influx.url),
                    ("sink.token", &influx.token),
                    ("sink.org", &influx.org),
                    ("sink.bucket", &influx.bucket),
                ] {
                    if value.trim().is_empty() {
                        return Err(eyre!("{key} is required for the influxdb sink"));
                    }
                }
            }
            SinkConfig::Clickhouse(clickhouse) => {
                if clickhouse.url.trim().is_empty() {
                    return Err(eyre!("sink.url is required for the clickhouse sink"));
                }
            }
            SinkConfig::Stdout => {}
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.game_type.as_str()) {
                return Err(eyre!(
                    "game type {} is bound to more than one provider",
                    provider.game_type
                ));
            }
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn config_dir(&self) -> &std::path::Path {
        &self.app_config.config_dir
    }
}
