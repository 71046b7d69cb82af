//! # Providers Module
//!
//! Adapters for the public statistics backends that report live occupancy for a server.
//!
//! - **`Provider` trait**: per-server lookup plus an optional once-per-tick batch pre-fetch
//! - **`GameToolsProvider`**: api.gametools.network, per-server lookup verified by battlelog id
//! - **`BattleBitProvider`**: official BattleBit server list, matched by exact name
//! - **`ProviderRegistry`**: static game type to adapter mapping built at startup
//!
//! Every transport, status and payload failure surfaces as a [`ProviderError`]. A lookup that
//! succeeds but does not identify the server resolves to `Ok(None)`.

mod battlebit;
mod gametools;
mod http;
mod registry;

use crate::metrics::EnrichmentSample;
pub use battlebit::BattleBitProvider;
pub use gametools::GameToolsProvider;
pub use http::DEFAULT_USER_AGENT;
pub use registry::ProviderRegistry;
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// A stats backend able to report occupancy for a server it knows by name.
pub trait Provider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Batch work that has to happen once per tick before any [`Provider::fetch_status`] call.
    fn prefetch(&self) -> ProviderFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    /// Looks up a server. `Ok(None)` means the provider does not know this exact server.
    fn fetch_status<'a>(
        &'a self,
        display_name: &'a str,
        cross_reference_id: Option<&'a str>,
    ) -> ProviderFuture<'a, Option<EnrichmentSample>>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("provider answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("server list is not available for this tick")]
    NotPrefetched,
    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}
