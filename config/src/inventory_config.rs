use serde::{
    Deserialize,
    Serialize,
};

/// Connection settings for the AdKats MariaDB/MySQL database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_port() -> u16 {
    3306
}

fn default_max_connections() -> u32 {
    5
}
