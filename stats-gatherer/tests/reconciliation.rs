mod common;

use common::{
    FakeInventory,
    RecordingSink,
};
use httpmock::prelude::*;
use player_count_stats_gatherer::{
    providers::{
        BattleBitProvider,
        GameToolsProvider,
    },
    EnrichmentSample,
    ProviderRegistry,
    ReconciliationLoop,
    ServerInventoryRecord,
    TickReport,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::{
    sync::Arc,
    time::Duration,
};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(2);

fn gametools(server: &MockServer, timeout: Duration) -> Arc<GameToolsProvider> {
    let base_url = Url::parse(&server.base_url()).unwrap();
    Arc::new(GameToolsProvider::new(base_url, None, timeout).unwrap())
}

fn battlebit(server: &MockServer) -> Arc<BattleBitProvider> {
    let base_url = Url::parse(&server.base_url()).unwrap();
    Arc::new(BattleBitProvider::new(base_url, None, TIMEOUT).unwrap())
}

fn alpha() -> ServerInventoryRecord {
    ServerInventoryRecord::new(1, Some("BF4"), "Alpha")
        .with_capacity(40, 64)
        .with_cross_reference("guid123")
}

fn detailed_server(server_link: &str) -> serde_json::Value {
    json!({
        "serverLink": server_link,
        "mode": "Conquest",
        "currentMap": "Metro",
        "playerAmount": 30,
        "inQueue": 2,
        "favorites": 5,
    })
}

fn reconcile(
    records: Vec<ServerInventoryRecord>,
    registry: ProviderRegistry,
    sink: Arc<RecordingSink>,
) -> ReconciliationLoop {
    ReconciliationLoop::new(Arc::new(FakeInventory::new(records)), Arc::new(registry), sink)
        .with_call_timeout(TIMEOUT)
}

#[tokio::test]
async fn verified_server_is_enriched() {
    let api = MockServer::start_async().await;
    let lookup = api
        .mock_async(|when, then| {
            when.method(GET)
                .path("/bf4/detailedserver/")
                .query_param("name", "Alpha")
                .query_param("platform", "pc");
            then.status(200).json_body(detailed_server("https://x/guid123/profile"));
        })
        .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BF4", gametools(&api, TIMEOUT));
    let sink = Arc::new(RecordingSink::default());

    let report = reconcile(vec![alpha()], registry, sink.clone()).tick().await;

    lookup.assert_async().await;
    assert_eq!(report.written, 1);
    assert_eq!(report.enriched, 1);

    let sample = sink.sample(1);
    assert_eq!((sample.used_slots, sample.max_slots), (40, 64));
    assert_eq!((sample.players, sample.queue, sample.favorites), (30, 2, 5));
    assert_eq!((sample.mode.as_str(), sample.map.as_str()), ("Conquest", "Metro"));
}

#[tokio::test]
async fn unverified_server_is_written_with_defaults() {
    let api = MockServer::start_async().await;
    api.mock_async(|when, then| {
        when.method(GET).path("/bf4/detailedserver/");
        then.status(200).json_body(detailed_server("https://x/otherguid/profile"));
    })
    .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BF4", gametools(&api, TIMEOUT));
    let sink = Arc::new(RecordingSink::default());

    let report = reconcile(vec![alpha()], registry, sink.clone()).tick().await;

    assert_eq!(report.not_found, 1);
    let sample = sink.sample(1);
    assert_eq!((sample.used_slots, sample.max_slots), (40, 64));
    assert_eq!(sample.enrichment(), EnrichmentSample::default());
}

#[tokio::test]
async fn unregistered_game_type_makes_no_call() {
    let api = MockServer::start_async().await;
    let any = api
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(detailed_server("https://x/guid123/profile"));
        })
        .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BF4", gametools(&api, TIMEOUT));
    let sink = Arc::new(RecordingSink::default());

    let records = vec![
        ServerInventoryRecord::new(7, Some("BFH"), "Hardline").with_capacity(12, 32),
        ServerInventoryRecord::new(8, None, "No game").with_capacity(0, 16),
    ];
    let report = reconcile(records, registry, sink.clone()).tick().await;

    assert_eq!(any.hits_async().await, 0);
    assert_eq!(report.no_provider, 2);
    assert_eq!(report.written, 2);
    assert_eq!(sink.sample(7).enrichment(), EnrichmentSample::default());
    assert_eq!(sink.sample(7).max_slots, 32);
}

#[tokio::test]
async fn missing_cross_reference_skips_the_lookup() {
    let api = MockServer::start_async().await;
    let any = api
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(detailed_server("https://x/guid123/profile"));
        })
        .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BF4", gametools(&api, TIMEOUT));
    let sink = Arc::new(RecordingSink::default());

    let record = ServerInventoryRecord::new(3, Some("BF4"), "Alpha").with_capacity(1, 2);
    let report = reconcile(vec![record], registry, sink.clone()).tick().await;

    assert_eq!(any.hits_async().await, 0);
    assert_eq!(report.not_found, 1);
    assert_eq!(sink.sample(3).enrichment(), EnrichmentSample::default());
}

#[tokio::test]
async fn provider_failures_degrade_single_servers() {
    let api = MockServer::start_async().await;
    api.mock_async(|when, then| {
        when.path("/bf4/detailedserver/").query_param("name", "Alpha");
        then.status(200).json_body(detailed_server("https://x/guid123/profile"));
    })
    .await;
    api.mock_async(|when, then| {
        when.path("/bf4/detailedserver/").query_param("name", "Broken");
        then.status(500).body("internal error");
    })
    .await;
    api.mock_async(|when, then| {
        when.path("/bf4/detailedserver/").query_param("name", "Garbled");
        then.status(200).body("{\"serverLink\": ");
    })
    .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BF4", gametools(&api, TIMEOUT));
    let sink = Arc::new(RecordingSink::default());

    let records = vec![
        alpha(),
        ServerInventoryRecord::new(2, Some("BF4"), "Broken")
            .with_capacity(10, 64)
            .with_cross_reference("guid2"),
        ServerInventoryRecord::new(4, Some("BF4"), "Garbled")
            .with_capacity(20, 64)
            .with_cross_reference("guid4"),
    ];
    let report = reconcile(records, registry, sink.clone()).tick().await;

    assert_eq!(report.written, 3);
    assert_eq!(report.enriched, 1);
    assert_eq!(report.unavailable, 2);
    assert_eq!(sink.sample(1).players, 30);
    assert_eq!(sink.sample(2).enrichment(), EnrichmentSample::default());
    assert_eq!(sink.sample(2).used_slots, 10);
    assert_eq!(sink.sample(4).enrichment(), EnrichmentSample::default());
}

#[tokio::test]
async fn slow_provider_times_out() {
    let api = MockServer::start_async().await;
    api.mock_async(|when, then| {
        when.path("/bf4/detailedserver/");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(detailed_server("https://x/guid123/profile"));
    })
    .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BF4", gametools(&api, Duration::from_millis(200)));
    let sink = Arc::new(RecordingSink::default());

    let report = ReconciliationLoop::new(Arc::new(FakeInventory::new(vec![alpha()])), Arc::new(registry), sink.clone())
        .with_call_timeout(Duration::from_millis(500))
        .tick()
        .await;

    assert_eq!(report.unavailable, 1);
    assert_eq!(report.written, 1);
    assert_eq!(sink.sample(1).enrichment(), EnrichmentSample::default());
}

#[tokio::test]
async fn battlebit_listing_is_fetched_once_per_tick() {
    let api = MockServer::start_async().await;
    let listing = api
        .mock_async(|when, then| {
            when.method(GET).path("/Servers/GetServerList");
            // The live API prefixes its payload with a byte order mark.
            let mut body = b"\xEF\xBB\xBF".to_vec();
            body.extend_from_slice(
                json!([
                    {"Name": "E4GL | Frontline", "Map": "Azagor", "Gamemode": "CONQ", "Players": 120, "QueuePlayers": 4},
                    {"Name": "E4GL | Infantry", "Map": "Wakistan", "Gamemode": "INFCONQ", "Players": 64, "QueuePlayers": 0},
                ])
                .to_string()
                .as_bytes(),
            );
            then.status(200).header("content-type", "application/json").body(body);
        })
        .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BBR", battlebit(&api));
    let sink = Arc::new(RecordingSink::default());

    let records = vec![
        ServerInventoryRecord::new(10, Some("BBR"), "E4GL | Frontline").with_capacity(120, 254),
        ServerInventoryRecord::new(11, Some("BBR"), "E4GL | Infantry").with_capacity(64, 128),
        ServerInventoryRecord::new(12, Some("BBR"), "E4GL | Gone").with_capacity(0, 128),
    ];
    let report = reconcile(records, registry, sink.clone()).tick().await;

    listing.assert_hits_async(1).await;
    assert_eq!(report.enriched, 2);
    assert_eq!(report.not_found, 1);
    assert_eq!(sink.sample(10).map, "Azagor");
    assert_eq!(sink.sample(10).queue, 4);
    assert_eq!(sink.sample(11).mode, "INFCONQ");
    assert_eq!(sink.sample(12).enrichment(), EnrichmentSample::default());
}

#[tokio::test]
async fn failed_battlebit_listing_degrades_its_servers() {
    let api = MockServer::start_async().await;
    api.mock_async(|when, then| {
        when.path("/Servers/GetServerList");
        then.status(503);
    })
    .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BBR", battlebit(&api));
    let sink = Arc::new(RecordingSink::default());

    let record = ServerInventoryRecord::new(10, Some("BBR"), "E4GL | Frontline").with_capacity(120, 254);
    let report = reconcile(vec![record], registry, sink.clone()).tick().await;

    assert_eq!(report.unavailable, 1);
    assert_eq!(report.written, 1);
    assert_eq!(sink.sample(10).used_slots, 120);
    assert_eq!(sink.sample(10).enrichment(), EnrichmentSample::default());
}

#[tokio::test]
async fn inventory_failure_skips_the_tick() {
    let api = MockServer::start_async().await;
    let any = api
        .mock_async(|when, then| {
            when.path("/bf4/detailedserver/");
            then.status(200).json_body(detailed_server("https://x/guid123/profile"));
        })
        .await;

    let mut registry = ProviderRegistry::new();
    registry.register("BF4", gametools(&api, TIMEOUT));
    let sink = Arc::new(RecordingSink::default());

    let report = ReconciliationLoop::new(Arc::new(FakeInventory::failing()), Arc::new(registry), sink.clone())
        .tick()
        .await;

    assert!(report.skipped);
    assert_eq!(report.written, 0);
    assert_eq!(any.hits_async().await, 0);
    assert!(sink.samples().is_empty());
}

#[tokio::test]
async fn sink_failure_does_not_stop_other_writes() {
    let registry = ProviderRegistry::new();
    let sink = Arc::new(RecordingSink::rejecting([2]));

    let records = vec![
        ServerInventoryRecord::new(1, None, "One").with_capacity(1, 10),
        ServerInventoryRecord::new(2, None, "Two").with_capacity(2, 10),
        ServerInventoryRecord::new(3, None, "Three").with_capacity(3, 10),
    ];
    let report = reconcile(records, registry, sink.clone()).tick().await;

    assert_eq!(
        report,
        TickReport {
            skipped: false,
            records: 3,
            written: 2,
            enriched: 0,
            no_provider: 3,
            not_found: 0,
            unavailable: 0,
            sink_failures: 1,
        }
    );
    let ids: Vec<u64> = sink.samples().iter().map(|s| s.server_id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn samples_of_a_tick_share_the_capture_time() {
    let sink = Arc::new(RecordingSink::default());
    let records = (1..=20)
        .map(|id| ServerInventoryRecord::new(id, None, format!("Server {id}")).with_capacity(0, 32))
        .collect();

    let report = reconcile(records, ProviderRegistry::new(), sink.clone())
        .with_max_concurrency(4)
        .tick()
        .await;

    assert_eq!(report.written, 20);
    let samples = sink.samples();
    assert!(samples.iter().all(|s| s.captured_at == samples[0].captured_at));
}

#[tokio::test]
async fn empty_inventory_writes_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let report = reconcile(Vec::new(), ProviderRegistry::new(), sink.clone()).tick().await;

    assert_eq!(report, TickReport::default());
    assert!(sink.samples().is_empty());
}
