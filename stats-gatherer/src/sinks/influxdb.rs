use super::{
    MetricSink,
    SinkError,
    SinkFuture,
};
use crate::metrics::MergedMetricSample;
use player_count_config::InfluxDbConfig;
use reqwest::{
    header::{
        HeaderMap,
        HeaderValue,
        AUTHORIZATION,
        CONTENT_TYPE,
    },
    Client,
};
use std::time::Duration;
use url::Url;

/// Writes points through the InfluxDB v2 HTTP write API.
pub struct InfluxDbSink {
    client: Client,
    write_url: Url,
    measurement: String,
}

impl InfluxDbSink {
    pub fn new(config: &InfluxDbConfig, timeout: Duration) -> Result<Self, SinkError> {
        let mut write_url = Url::parse(&format!("{}/api/v2/write", config.url.trim_end_matches('/')))?;
        write_url
            .query_pairs_mut()
            .append_pair("org", &config.org)
            .append_pair("bucket", &config.bucket)
            .append_pair("precision", "ms");

        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&format!("Token {}", config.token))
            .map_err(|_| SinkError::Config("sink.token contains characters not allowed in a header".to_string()))?;
        token.set_sensitive(true);
        headers.insert(AUTHORIZATION, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));

        let client = Client::builder().default_headers(headers).timeout(timeout).build()?;

        Ok(Self {
            client,
            write_url,
            measurement: config.measurement.clone(),
        })
    }

    async fn write_point(&self, sample: &MergedMetricSample) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.write_url.clone())
            .body(line_protocol(&self.measurement, sample))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

impl MetricSink for InfluxDbSink {
    fn name(&self) -> &'static str {
        "influxdb"
    }

    fn write<'a>(&'a self, sample: &'a MergedMetricSample) -> SinkFuture<'a> {
        Box::pin(self.write_point(sample))
    }
}

/// Encodes a sample as one InfluxDB line with a millisecond timestamp.
pub fn line_protocol(measurement: &str, sample: &MergedMetricSample) -> String {
    format!(
        "{measurement},server_id={server_id} used_slots={used}i,max_slots={max}i,players={players}i,queue={queue}i,favorites={favorites}i,mode=\"{mode}\",map=\"{map}\" {ts}",
        measurement = escape_measurement(measurement),
        server_id = sample.server_id,
        used = sample.used_slots,
        max = sample.max_slots,
        players = sample.players,
        queue = sample.queue,
        favorites = sample.favorites,
        mode = escape_string_field(&sample.mode),
        map = escape_string_field(&sample.map),
        ts = sample.captured_at.timestamp_millis(),
    )
}

fn escape_measurement(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_string_field(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}
