use clap::Parser;
use std::path::PathBuf;

/// Logs live game server occupancy to a time-series database.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Path to a YAML config file, layered over the defaults and the user config directory.
    #[clap(short, long, value_name = "FILE", env = "PLAYER_COUNT_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Seconds between tick starts. Overrides `interval_seconds`.
    #[clap(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Run a single tick and exit.
    #[clap(long, action)]
    pub once: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[clap(short, long, action)]
    pub verbose: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(interval) = self.interval {
                cache.insert("interval_seconds".to_string(), interval.into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "{version}\n\
Authors: {author}

Config directory: {config_dir_path}",
        version = clap::crate_version!(),
    )
}
