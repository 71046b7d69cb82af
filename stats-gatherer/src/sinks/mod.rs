//! # Sinks Module
//!
//! Write-only persistence for merged samples. One call to [`MetricSink::write`] persists one
//! point; a failure only concerns that point.

mod clickhouse;
mod influxdb;
mod stdout;

use crate::metrics::MergedMetricSample;
pub use self::clickhouse::ClickHouseSink;
pub use influxdb::{
    line_protocol,
    InfluxDbSink,
};
use player_count_config::SinkConfig;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::Duration,
};
pub use stdout::StdoutSink;

pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;

pub trait MetricSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Persists one sample. Writing the same server and timestamp twice overwrites the point.
    fn write<'a>(&'a self, sample: &'a MergedMetricSample) -> SinkFuture<'a>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sink rejected the write with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("clickhouse insert failed: {0}")]
    ClickHouse(#[from] ::clickhouse::error::Error),
    #[error("failed to encode sample: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid sink url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid sink configuration: {0}")]
    Config(String),
}

/// Creates the sink selected by `sink.kind`.
pub fn build_sink(config: &SinkConfig, timeout: Duration) -> Result<Arc<dyn MetricSink>, SinkError> {
    let sink: Arc<dyn MetricSink> = match config {
        SinkConfig::Influxdb(influx) => Arc::new(InfluxDbSink::new(influx, timeout)?),
        SinkConfig::Clickhouse(clickhouse) => Arc::new(ClickHouseSink::new(clickhouse, timeout)),
        SinkConfig::Stdout => Arc::new(StdoutSink),
    };
    Ok(sink)
}
