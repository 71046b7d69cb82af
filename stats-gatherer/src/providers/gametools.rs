use super::{
    http,
    Provider,
    ProviderError,
    ProviderFuture,
};
use crate::metrics::EnrichmentSample;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{
    debug,
    error,
    warn,
};
use url::Url;

/// Battlefield 4 server details from api.gametools.network.
///
/// The detailed-server endpoint searches by name, so a same-named server can be returned. A
/// result is only accepted when its `serverLink` contains the battlelog id from the inventory.
pub struct GameToolsProvider {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl GameToolsProvider {
    pub fn new(base_url: Url, user_agent: Option<&str>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http::build_client(user_agent, timeout)?,
            base_url,
            timeout,
        })
    }

    async fn detailed_server(&self, name: &str) -> Result<DetailedServer, ProviderError> {
        let url = http::endpoint(&self.base_url, "bf4/detailedserver/")?;
        let request = self.client.get(url).query(&[
            ("name", name),
            ("region", "all"),
            ("platform", "pc"),
            ("lang", "en-us"),
        ]);
        http::fetch_json(request, self.timeout).await
    }

    async fn lookup(
        &self,
        display_name: &str,
        battlelog_id: Option<&str>,
    ) -> Result<Option<EnrichmentSample>, ProviderError> {
        let Some(battlelog_id) = battlelog_id else {
            warn!(server = display_name, "No battlelog id configured, cannot verify the API profile");
            return Ok(None);
        };

        let server = self.detailed_server(display_name).await?;
        let server_link = server.server_link.as_deref().unwrap_or_default();

        // Substring match on purpose: the link embeds the guid among other path segments.
        if !server_link.contains(battlelog_id) {
            error!(
                critical = true,
                server = display_name,
                battlelog_id,
                server_link,
                "Unable to find API profile, the returned server belongs to a different battlelog id"
            );
            return Ok(None);
        }

        debug!(server = display_name, players = ?server.player_amount, "Fetched detailed server");
        Ok(Some(server.into_sample()))
    }
}

impl Provider for GameToolsProvider {
    fn name(&self) -> &'static str {
        "gametools"
    }

    fn fetch_status<'a>(
        &'a self,
        display_name: &'a str,
        cross_reference_id: Option<&'a str>,
    ) -> ProviderFuture<'a, Option<EnrichmentSample>> {
        Box::pin(self.lookup(display_name, cross_reference_id))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailedServer {
    #[serde(default)]
    server_link: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    current_map: Option<String>,
    #[serde(default)]
    player_amount: Option<u32>,
    #[serde(default)]
    in_queue: Option<u32>,
    /// Sent as a number or as a numeric string depending on the API version.
    #[serde(default)]
    favorites: Option<serde_json::Value>,
}

impl DetailedServer {
    fn into_sample(self) -> EnrichmentSample {
        let favorites = self.favorites.as_ref().and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        EnrichmentSample::from_parts(
            self.mode,
            self.current_map,
            self.player_amount,
            self.in_queue,
            favorites,
        )
    }
}
