use serde::{
    Deserialize,
    Serialize,
};

/// Where merged samples are written. Selected by `sink.kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    Influxdb(InfluxDbConfig),
    Clickhouse(ClickHouseConfig),
    /// One JSON line per sample on stdout.
    Stdout,
}

impl SinkConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SinkConfig::Influxdb(_) => "influxdb",
            SinkConfig::Clickhouse(_) => "clickhouse",
            SinkConfig::Stdout => "stdout",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfluxDbConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_clickhouse_user")]
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_measurement")]
    pub table: String,
}

fn default_measurement() -> String {
    "server_status".to_string()
}

fn default_clickhouse_user() -> String {
    "default".to_string()
}
