use crate::{
    inventory::InventorySource,
    metrics::{
        EnrichmentSample,
        MergedMetricSample,
        ServerInventoryRecord,
    },
    providers::ProviderRegistry,
    sinks::MetricSink,
};
use chrono::{
    DateTime,
    Utc,
};
use futures::{
    stream,
    StreamExt,
};
use serde::Serialize;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::Duration,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

const DEFAULT_MAX_CONCURRENCY: usize = 16;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// The inventory could not be read, nothing was written.
    pub skipped: bool,
    pub records: usize,
    pub written: usize,
    pub enriched: usize,
    pub no_provider: usize,
    pub not_found: usize,
    pub unavailable: usize,
    pub sink_failures: usize,
}

impl TickReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn degraded(&self) -> usize {
        self.no_provider + self.not_found + self.unavailable
    }

    fn record(&mut self, outcome: ServerOutcome) {
        self.records += 1;
        match outcome.enrichment {
            Enrichment::Fetched => self.enriched += 1,
            Enrichment::NoProvider => self.no_provider += 1,
            Enrichment::NotFound => self.not_found += 1,
            Enrichment::Unavailable => self.unavailable += 1,
        }
        if outcome.written {
            self.written += 1;
        } else {
            self.sink_failures += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Enrichment {
    Fetched,
    NoProvider,
    NotFound,
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
struct ServerOutcome {
    enrichment: Enrichment,
    written: bool,
}

/// A unit of work the [`super::Scheduler`] can drive.
pub trait Tick: Send + Sync {
    fn run_once(&self) -> Pin<Box<dyn Future<Output = TickReport> + Send + '_>>;
}

/// Correlates the inventory with the providers and writes one sample per server.
///
/// Failures below the inventory query are contained per server: a server whose provider is
/// missing, does not know it, or cannot be reached is written with default enrichment.
pub struct ReconciliationLoop {
    inventory: Arc<dyn InventorySource>,
    registry: Arc<ProviderRegistry>,
    sink: Arc<dyn MetricSink>,
    max_concurrency: usize,
    call_timeout: Duration,
}

impl ReconciliationLoop {
    pub fn new(inventory: Arc<dyn InventorySource>, registry: Arc<ProviderRegistry>, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            inventory,
            registry,
            sink,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Upper bound of servers processed at the same time.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Bound applied to each provider lookup and sink write.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Runs a single tick. Never fails: an unreadable inventory yields a skipped report.
    pub async fn tick(&self) -> TickReport {
        // Batch listings must be complete before any server reads them.
        self.registry.prefetch_all().await;

        let captured_at = Utc::now();
        let records = match self.inventory.fetch_active_servers().await {
            Ok(records) => records,
            Err(err) => {
                error!(error = %err, "Inventory unavailable, skipping tick");
                return TickReport::skipped();
            }
        };

        let outcomes: Vec<ServerOutcome> = stream::iter(records)
            .map(|record| self.process(record, captured_at))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut report = TickReport::default();
        for outcome in outcomes {
            report.record(outcome);
        }
        report
    }

    async fn process(&self, record: ServerInventoryRecord, captured_at: DateTime<Utc>) -> ServerOutcome {
        let (enrichment, sample) = self.enrich(&record).await;
        let merged = MergedMetricSample::merge(&record, sample, captured_at);

        let written = match tokio::time::timeout(self.call_timeout, self.sink.write(&merged)).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(server_id = record.server_id, sink = self.sink.name(), error = %err, "Failed to write sample");
                false
            }
            Err(_) => {
                warn!(server_id = record.server_id, sink = self.sink.name(), timeout = ?self.call_timeout, "Sample write timed out");
                false
            }
        };

        ServerOutcome { enrichment, written }
    }

    async fn enrich(&self, record: &ServerInventoryRecord) -> (Enrichment, EnrichmentSample) {
        let provider = record
            .game_type
            .as_deref()
            .and_then(|game_type| self.registry.resolve(game_type));
        let Some(provider) = provider else {
            debug!(server_id = record.server_id, game_type = ?record.game_type, "No provider for game type");
            return (Enrichment::NoProvider, EnrichmentSample::default());
        };

        let lookup = provider.fetch_status(&record.display_name, record.cross_reference_id.as_deref());
        match tokio::time::timeout(self.call_timeout, lookup).await {
            Ok(Ok(Some(sample))) => (Enrichment::Fetched, sample),
            Ok(Ok(None)) => {
                debug!(server_id = record.server_id, provider = provider.name(), "Server not found at provider");
                (Enrichment::NotFound, EnrichmentSample::default())
            }
            Ok(Err(err)) => {
                warn!(server_id = record.server_id, provider = provider.name(), error = %err, "Provider unavailable");
                (Enrichment::Unavailable, EnrichmentSample::default())
            }
            Err(_) => {
                warn!(server_id = record.server_id, provider = provider.name(), timeout = ?self.call_timeout, "Provider lookup timed out");
                (Enrichment::Unavailable, EnrichmentSample::default())
            }
        }
    }
}

impl Tick for ReconciliationLoop {
    fn run_once(&self) -> Pin<Box<dyn Future<Output = TickReport> + Send + '_>> {
        Box::pin(async move {
            let report = self.tick().await;
            if !report.skipped {
                info!(
                    records = report.records,
                    written = report.written,
                    degraded = report.degraded(),
                    sink_failures = report.sink_failures,
                    "Tick completed"
                );
            }
            report
        })
    }
}
