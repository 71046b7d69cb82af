#![allow(dead_code)]

use player_count_stats_gatherer::{
    inventory::InventoryFuture,
    sinks::SinkFuture,
    InventoryError,
    InventorySource,
    MergedMetricSample,
    MetricSink,
    ServerInventoryRecord,
    SinkError,
};
use std::{
    collections::HashSet,
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Mutex,
    },
};

/// Inventory returning a fixed snapshot, or failing when built with [`FakeInventory::failing`].
pub struct FakeInventory {
    records: Option<Vec<ServerInventoryRecord>>,
    pub calls: AtomicUsize,
}

impl FakeInventory {
    pub fn new(records: Vec<ServerInventoryRecord>) -> Self {
        Self {
            records: Some(records),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            records: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl InventorySource for FakeInventory {
    fn fetch_active_servers(&self) -> InventoryFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .records
            .clone()
            .ok_or_else(|| InventoryError::Unavailable("connection refused".to_string()));
        Box::pin(async move { result })
    }
}

/// Keeps every written sample in memory. Writes for `reject` server ids fail.
#[derive(Default)]
pub struct RecordingSink {
    samples: Mutex<Vec<MergedMetricSample>>,
    reject: HashSet<u64>,
}

impl RecordingSink {
    pub fn rejecting(server_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            reject: server_ids.into_iter().collect(),
        }
    }

    /// Written samples ordered by server id.
    pub fn samples(&self) -> Vec<MergedMetricSample> {
        let mut samples = self.samples.lock().unwrap().clone();
        samples.sort_by_key(|s| s.server_id);
        samples
    }

    pub fn sample(&self, server_id: u64) -> MergedMetricSample {
        self.samples()
            .into_iter()
            .find(|s| s.server_id == server_id)
            .unwrap_or_else(|| panic!("no sample written for server {server_id}"))
    }
}

impl MetricSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn write<'a>(&'a self, sample: &'a MergedMetricSample) -> SinkFuture<'a> {
        Box::pin(async move {
            if self.reject.contains(&sample.server_id) {
                return Err(SinkError::Rejected {
                    status: 500,
                    body: "write refused".to_string(),
                });
            }
            self.samples.lock().unwrap().push(sample.clone());
            Ok(())
        })
    }
}
