//! # Player Count Stats Gatherer
//!
//! Periodically records how full each managed game server is.
//!
//! ## Architecture
//!
//! - **`inventory`**: servers that are currently connected, read from the AdKats MySQL database
//! - **`providers`**: public stats backends (gametools, BattleBit) routed by game type
//! - **`metrics`**: inventory records, provider samples and the merged point
//! - **`sinks`**: time-series backends the merged points are written to
//! - **`collectors`**: the reconciliation loop and its drift-compensating scheduler
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run(config: player_count_config::Config) -> Result<(), Box<dyn std::error::Error>> {
//! use player_count_stats_gatherer::{
//!     build_sink,
//!     MySqlInventory,
//!     ProviderRegistry,
//!     ReconciliationLoop,
//! };
//! use std::sync::Arc;
//!
//! let timeout = config.request_timeout();
//! let inventory = Arc::new(MySqlInventory::connect_lazy(&config.inventory, timeout));
//! let registry = Arc::new(ProviderRegistry::from_config(&config.providers, timeout)?);
//! let sink = build_sink(&config.sink, timeout)?;
//!
//! let report = ReconciliationLoop::new(inventory, registry, sink).tick().await;
//! println!("wrote {} samples", report.written);
//! # Ok(())
//! # }
//! ```

pub mod collectors;
pub mod inventory;
pub mod metrics;
pub mod providers;
pub mod sinks;

pub use collectors::*;
pub use inventory::{
    InventoryError,
    InventorySource,
    MySqlInventory,
};
pub use metrics::*;
pub use providers::{
    Provider,
    ProviderError,
    ProviderRegistry,
};
pub use sinks::{
    build_sink,
    MetricSink,
    SinkError,
};
