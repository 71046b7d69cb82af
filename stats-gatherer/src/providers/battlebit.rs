use super::{
    http,
    Provider,
    ProviderError,
    ProviderFuture,
};
use crate::metrics::EnrichmentSample;
use reqwest::Client;
use serde::Deserialize;
use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};
use tokio::sync::RwLock;
use tracing::{
    debug,
    error,
    warn,
};
use url::Url;

type Listing = Arc<HashMap<String, EnrichmentSample>>;

/// BattleBit Remastered servers from the official public server list.
///
/// The list is downloaded once per tick by [`Provider::prefetch`] and servers are matched by
/// exact name, the API exposes no other identifier. Each pre-fetch replaces the previous
/// listing and a failed one clears it, so a listing never outlives its tick.
pub struct BattleBitProvider {
    client: Client,
    base_url: Url,
    timeout: Duration,
    listing: RwLock<Option<Listing>>,
}

impl BattleBitProvider {
    pub fn new(base_url: Url, user_agent: Option<&str>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::build_client(user_agent, timeout)?,
            base_url,
            timeout,
            listing: RwLock::new(None),
        })
    }

    async fn fetch_listing(&self) -> Result<Listing, ProviderError> {
        let url = http::endpoint(&self.base_url, "Servers/GetServerList")?;
        let servers: Vec<ListedServer> = http::fetch_json(self.client.get(url), self.timeout).await?;

        let mut listing = HashMap::with_capacity(servers.len());
        for server in servers {
            // First entry wins for duplicated names.
            listing.entry(server.name.clone()).or_insert_with(|| server.into_sample());
        }
        Ok(Arc::new(listing))
    }

    async fn refresh(&self) -> Result<(), ProviderError> {
        match self.fetch_listing().await {
            Ok(listing) => {
                debug!(servers = listing.len(), "Fetched BattleBit server list");
                *self.listing.write().await = Some(listing);
                Ok(())
            }
            Err(err) => {
                *self.listing.write().await = None;
                Err(err)
            }
        }
    }

    async fn lookup(&self, display_name: &str) -> Result<Option<EnrichmentSample>, ProviderError> {
        let listing = self.listing.read().await.clone();
        let Some(listing) = listing else {
            warn!(server = display_name, "BattleBit server list missing for this tick");
            return Err(ProviderError::NotPrefetched);
        };

        let sample = listing.get(display_name).cloned();
        if sample.is_none() {
            error!(critical = true, server = display_name, "Server not found in the BattleBit server list");
        }
        Ok(sample)
    }
}

impl Provider for BattleBitProvider {
    fn name(&self) -> &'static str {
        "battlebit"
    }

    fn prefetch(&self) -> ProviderFuture<'_, ()> {
        Box::pin(self.refresh())
    }

    fn fetch_status<'a>(
        &'a self,
        display_name: &'a str,
        _cross_reference_id: Option<&'a str>,
    ) -> ProviderFuture<'a, Option<EnrichmentSample>> {
        Box::pin(self.lookup(display_name))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedServer {
    name: String,
    #[serde(default)]
    map: Option<String>,
    #[serde(default)]
    gamemode: Option<String>,
    #[serde(default)]
    players: Option<u32>,
    #[serde(default)]
    queue_players: Option<u32>,
}

impl ListedServer {
    fn into_sample(self) -> EnrichmentSample {
        // The server list carries no favorites count.
        EnrichmentSample::from_parts(self.gamemode, self.map, self.players, self.queue_players, None)
    }
}
