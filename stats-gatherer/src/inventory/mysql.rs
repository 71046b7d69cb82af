use super::{
    InventoryError,
    InventoryFuture,
    InventorySource,
};
use crate::metrics::ServerInventoryRecord;
use player_count_config::InventoryConfig;
use sqlx::mysql::{
    MySqlConnectOptions,
    MySqlPool,
    MySqlPoolOptions,
};
use std::time::Duration;
use tracing::{
    debug,
    info,
    warn,
};

// Casts pin the column types so decoding does not depend on the exact AdKats schema revision.
const ACTIVE_SERVERS_QUERY: &str = "
    SELECT
        CAST(ts.ServerID AS UNSIGNED) AS server_id,
        CAST(ts.ServerName AS CHAR) AS server_name,
        CAST(ts.usedSlots AS UNSIGNED) AS used_slots,
        CAST(ts.maxSlots AS UNSIGNED) AS max_slots,
        CAST(tg.Name AS CHAR) AS game,
        CAST(bss.battlelog_guid AS CHAR) AS battlelog_guid
    FROM tbl_server ts
    LEFT JOIN tbl_games tg ON ts.GameID = tg.GameID
    LEFT OUTER JOIN bfacp_settings_servers bss ON ts.ServerID = bss.server_id
    WHERE ts.ConnectionState != 'off'
    ORDER BY ts.ServerID
";

/// Reads the active servers from the AdKats MariaDB/MySQL database.
///
/// The pool is created lazily and lives for the whole process, so a database that is down at
/// startup only costs the ticks until it comes back.
pub struct MySqlInventory {
    pool: MySqlPool,
    timeout: Duration,
}

impl MySqlInventory {
    pub fn new(pool: MySqlPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn connect_lazy(config: &InventoryConfig, timeout: Duration) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(timeout)
            .idle_timeout(Duration::from_secs(300))
            .connect_lazy_with(options);

        Self::new(pool, timeout)
    }

    async fn query_active_servers(&self) -> Result<Vec<ServerInventoryRecord>, InventoryError> {
        let rows: Vec<InventoryRow> = tokio::time::timeout(
            self.timeout,
            sqlx::query_as::<_, InventoryRow>(ACTIVE_SERVERS_QUERY).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| InventoryError::Timeout(self.timeout))??;

        if rows.is_empty() {
            info!("Found 0 active servers in the inventory");
        } else {
            debug!(count = rows.len(), "Received server status from the inventory");
        }

        Ok(rows.into_iter().map(InventoryRow::into_record).collect())
    }
}

impl InventorySource for MySqlInventory {
    fn fetch_active_servers(&self) -> InventoryFuture<'_> {
        Box::pin(self.query_active_servers())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct InventoryRow {
    server_id: u64,
    server_name: Option<String>,
    used_slots: Option<u64>,
    max_slots: Option<u64>,
    game: Option<String>,
    battlelog_guid: Option<String>,
}

impl InventoryRow {
    fn into_record(self) -> ServerInventoryRecord {
        let used_slots = saturate(self.used_slots);
        let max_slots = saturate(self.max_slots);
        if used_slots > max_slots {
            warn!(server_id = self.server_id, used_slots, max_slots, "Server reports more used than max slots");
        }

        ServerInventoryRecord {
            server_id: self.server_id,
            game_type: non_blank(self.game),
            display_name: self.server_name.unwrap_or_default(),
            used_slots,
            max_slots,
            cross_reference_id: non_blank(self.battlelog_guid),
        }
    }
}

fn saturate(value: Option<u64>) -> u32 {
    value.map(|v| u32::try_from(v).unwrap_or(u32::MAX)).unwrap_or(0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
