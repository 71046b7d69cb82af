//! # Inventory Module
//!
//! The read-only list of servers the logger polls. [`InventorySource`] is the seam the
//! reconciliation loop depends on; [`MySqlInventory`] reads it from the AdKats database.

mod mysql;

use crate::metrics::ServerInventoryRecord;
pub use mysql::MySqlInventory;
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};

pub type InventoryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<ServerInventoryRecord>, InventoryError>> + Send + 'a>>;

/// Source of the servers that are currently connected.
pub trait InventorySource: Send + Sync {
    /// Returns every server whose connection state is not `off`, including servers without a
    /// game type. An error means the snapshot could not be read at all.
    fn fetch_active_servers(&self) -> InventoryFuture<'_>;
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("inventory query timed out after {0:?}")]
    Timeout(Duration),
    #[error("inventory unavailable: {0}")]
    Unavailable(String),
}
