use anyhow::Result;
use tracing::info;

use crate::client::PostgresClient;

const DEVICES_SCHEMA: &str = include_str!("../migrations/001_devices.sql");

/// Applies the devices schema. Statements are idempotent, so this is safe to
/// run on every startup.
pub async fn ensure_schema(client: &PostgresClient) -> Result<()> {
    let conn = client.get_connection().await?;
    conn.batch_execute(DEVICES_SCHEMA).await?;
    info!("Devices schema is up to date");
    Ok(())
}
