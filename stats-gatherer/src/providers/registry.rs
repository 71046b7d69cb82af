use super::{
    BattleBitProvider,
    GameToolsProvider,
    Provider,
    ProviderError,
};
use futures::future::join_all;
use player_count_config::{
    ProviderConfig,
    ProviderKind,
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};
use tracing::{
    info,
    warn,
};

/// Maps an inventory game type to the provider responsible for it.
///
/// Built once at startup and only read afterwards. Game types are matched exactly.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(configs: &[ProviderConfig], timeout: Duration) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        for config in configs {
            let user_agent = config.user_agent.as_deref();
            let provider: Arc<dyn Provider> = match config.kind {
                ProviderKind::GameTools => Arc::new(GameToolsProvider::new(config.base_url.clone(), user_agent, timeout)?),
                ProviderKind::BattleBit => Arc::new(BattleBitProvider::new(config.base_url.clone(), user_agent, timeout)?),
            };
            info!(game_type = %config.game_type, provider = %config.kind, base_url = %config.base_url, "Registered provider");
            registry.register(config.game_type.clone(), provider);
        }
        Ok(registry)
    }

    /// Binds `game_type` to `provider`, returning the provider it replaced.
    pub fn register(&mut self, game_type: impl Into<String>, provider: Arc<dyn Provider>) -> Option<Arc<dyn Provider>> {
        self.providers.insert(game_type.into(), provider)
    }

    pub fn resolve(&self, game_type: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(game_type).cloned()
    }

    pub fn game_types(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Runs every provider's batch pre-fetch concurrently and waits for all of them.
    ///
    /// A provider bound to several game types is pre-fetched once. Failures are logged; the
    /// affected provider then degrades its servers for this tick. Returns the number of failures.
    pub async fn prefetch_all(&self) -> usize {
        let mut unique: Vec<&Arc<dyn Provider>> = Vec::with_capacity(self.providers.len());
        for provider in self.providers.values() {
            if !unique.iter().any(|seen| same_provider(seen, provider)) {
                unique.push(provider);
            }
        }

        let results = join_all(unique.iter().map(|provider| async move {
            let result = provider.prefetch().await;
            (provider.name(), result)
        }))
        .await;

        let mut failures = 0;
        for (provider, result) in results {
            if let Err(err) = result {
                warn!(provider, error = %err, "Provider pre-fetch failed");
                failures += 1;
            }
        }
        failures
    }
}

fn same_provider(a: &Arc<dyn Provider>, b: &Arc<dyn Provider>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
