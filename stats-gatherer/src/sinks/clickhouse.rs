use super::{
    MetricSink,
    SinkError,
    SinkFuture,
};
use crate::metrics::MergedMetricSample;
use clickhouse::Client;
use player_count_config::ClickHouseConfig;
use serde::Serialize;
use std::time::Duration;

/// Inserts one row per sample into a ClickHouse table.
///
/// Expected table layout:
///
/// ```sql
/// CREATE TABLE server_status (
///     ts DateTime64(3, 'UTC'),
///     server_id UInt64,
///     used_slots UInt32,
///     max_slots UInt32,
///     players UInt32,
///     queue UInt32,
///     favorites UInt32,
///     mode String,
///     map String
/// ) ENGINE = ReplacingMergeTree ORDER BY (server_id, ts)
/// ```
pub struct ClickHouseSink {
    client: Client,
    table: String,
    timeout: Duration,
}

impl ClickHouseSink {
    pub fn new(config: &ClickHouseConfig, timeout: Duration) -> Self {
        let mut client = Client::default()
            .with_url(config.url.clone())
            .with_user(config.user.clone());

        if let Some(password) = &config.password {
            client = client.with_password(password.clone());
        }
        if let Some(database) = &config.database {
            client = client.with_database(database.clone());
        }

        Self {
            client,
            table: config.table.clone(),
            timeout,
        }
    }

    async fn insert(&self, sample: &MergedMetricSample) -> Result<(), SinkError> {
        let mut insert = self
            .client
            .insert::<ServerStatusRow>(&self.table)?
            .with_timeouts(Some(self.timeout), Some(self.timeout));
        insert.write(&ServerStatusRow::from(sample)).await?;
        insert.end().await?;
        Ok(())
    }
}

impl MetricSink for ClickHouseSink {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn write<'a>(&'a self, sample: &'a MergedMetricSample) -> SinkFuture<'a> {
        Box::pin(self.insert(sample))
    }
}

#[derive(Debug, Clone, Serialize, clickhouse::Row)]
struct ServerStatusRow {
    ts: i64, // milliseconds since epoch
    server_id: u64,
    used_slots: u32,
    max_slots: u32,
    players: u32,
    queue: u32,
    favorites: u32,
    mode: String,
    map: String,
}

impl From<&MergedMetricSample> for ServerStatusRow {
    fn from(sample: &MergedMetricSample) -> Self {
        Self {
            ts: sample.captured_at.timestamp_millis(),
            server_id: sample.server_id,
            used_slots: sample.used_slots,
            max_slots: sample.max_slots,
            players: sample.players,
            queue: sample.queue,
            favorites: sample.favorites,
            mode: sample.mode.clone(),
            map: sample.map.clone(),
        }
    }
}
