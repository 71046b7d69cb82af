use serde::{
    Deserialize,
    Serialize,
};

/// One active server as listed by the inventory database.
///
/// Re-read on every tick and never mutated; nothing is carried over between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInventoryRecord {
    pub server_id: u64,
    /// Selects the provider, e.g. `BF4`. `None` when the server has no game assigned.
    pub game_type: Option<String>,
    /// Name used for the provider lookup. Not unique across game types.
    pub display_name: String,
    pub used_slots: u32,
    pub max_slots: u32,
    /// Disambiguates same-named servers at providers that expose an identifier (battlelog guid).
    pub cross_reference_id: Option<String>,
}

impl ServerInventoryRecord {
    pub fn new(server_id: u64, game_type: Option<&str>, display_name: impl Into<String>) -> Self {
        Self {
            server_id,
            game_type: game_type.map(str::to_string),
            display_name: display_name.into(),
            used_slots: 0,
            max_slots: 0,
            cross_reference_id: None,
        }
    }

    pub fn with_capacity(mut self, used_slots: u32, max_slots: u32) -> Self {
        self.used_slots = used_slots;
        self.max_slots = max_slots;
        self
    }

    pub fn with_cross_reference(mut self, cross_reference_id: impl Into<String>) -> Self {
        self.cross_reference_id = Some(cross_reference_id.into());
        self
    }
}
