//! # Collectors Module
//!
//! The periodic work of the logger.
//!
//! ## Architecture
//!
//! - **`ReconciliationLoop`**: one tick reads the inventory, enriches every server through its
//!   provider and writes one merged sample per server to the sink
//! - **`Scheduler`**: repeats a [`Tick`] at a fixed interval, compensating for the time the
//!   tick itself took
//!
//! A tick never fails as a whole once the inventory has been read. Per-server problems degrade
//! the affected sample to default enrichment and are counted in the [`TickReport`].

pub mod reconciler;
pub mod scheduler;

// Re-export the main types for easy access
pub use reconciler::{
    ReconciliationLoop,
    Tick,
    TickReport,
};
pub use scheduler::Scheduler;
