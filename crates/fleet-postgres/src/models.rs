use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleet_domain::{Device, DomainError};

/// Device row for PostgreSQL storage. `state` is stored as text and parsed
/// back into the closed domain enum on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRow {
    pub device_id: String,
    pub device_name: String,
    pub brand: String,
    pub state: String,
    pub creation_time: DateTime<Utc>,
    pub version: i64,
}

impl TryFrom<DeviceRow> for Device {
    type Error = DomainError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse()
            .map_err(|e: String| DomainError::RepositoryError(anyhow!(e)))?;

        Ok(Device {
            id: row.device_id,
            name: row.device_name,
            brand: row.brand,
            state,
            creation_time: row.creation_time,
            version: row.version,
        })
    }
}

impl From<&tokio_postgres::Row> for DeviceRow {
    fn from(row: &tokio_postgres::Row) -> Self {
        DeviceRow {
            device_id: row.get(0),
            device_name: row.get(1),
            brand: row.get(2),
            state: row.get(3),
            creation_time: row.get(4),
            version: row.get(5),
        }
    }
}
