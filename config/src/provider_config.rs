use serde::{
    Deserialize,
    Serialize,
};
use strum::Display;

/// The stats backends an inventory game type can be routed to.
#[derive(Debug, Clone, Copy, Display, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// api.gametools.network, looked up per server by name and verified by battlelog id.
    GameTools,
    /// The official BattleBit server list, fetched once per tick and matched by name.
    BattleBit,
}

/// Binds one inventory game type (e.g. `BF4`) to a provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub game_type: String,
    pub kind: ProviderKind,
    pub base_url: url::Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}
