use async_trait::async_trait;
use tracing::debug;

use fleet_domain::{
    Device, DeviceRepository, DeviceSort, DeviceState, DomainError, DomainResult, NewDevice,
    PageRequest, SortDirection,
};

use crate::client::PostgresClient;
use crate::models::DeviceRow;

const DEVICE_COLUMNS: &str = "device_id, device_name, brand, state, creation_time, version";

/// PostgreSQL implementation of the DeviceRepository trait.
#[derive(Clone)]
pub struct PostgresDeviceRepository {
    client: PostgresClient,
}

impl PostgresDeviceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    async fn insert_device(&self, input: NewDevice) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let device_id = xid::new().to_string();

        conn.execute(
            "INSERT INTO devices (device_id, device_name, brand, state, creation_time, version)
             VALUES ($1, $2, $3, $4, $5, 0)",
            &[
                &device_id,
                &input.name,
                &input.brand,
                &input.state.to_string(),
                &input.creation_time,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(device_id = %device_id, "Inserted device");

        Ok(Device {
            id: device_id,
            name: input.name,
            brand: input.brand,
            state: input.state,
            creation_time: input.creation_time,
            version: 0,
        })
    }

    async fn find_device(&self, device_id: &str) -> DomainResult<Option<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE device_id = $1");
        let row = conn
            .query_opt(query.as_str(), &[&device_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => Ok(Some(DeviceRow::from(&row).try_into()?)),
            None => Ok(None),
        }
    }

    async fn replace_device(&self, device: Device) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // Conditional on the version read with the record. Zero rows means
        // another writer won the race or the record was deleted meanwhile.
        let query = format!(
            "UPDATE devices
             SET device_name = $2, brand = $3, state = $4, version = version + 1
             WHERE device_id = $1 AND version = $5
             RETURNING {DEVICE_COLUMNS}"
        );
        let row = conn
            .query_opt(
                query.as_str(),
                &[
                    &device.id,
                    &device.name,
                    &device.brand,
                    &device.state.to_string(),
                    &device.version,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(device_id = %device.id, "Replaced device");
                Ok(DeviceRow::from(&row).try_into()?)
            }
            None => Err(DomainError::ConcurrentModification(device.id)),
        }
    }

    async fn delete_device(&self, device_id: &str) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let deleted = conn
            .execute("DELETE FROM devices WHERE device_id = $1", &[&device_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(device_id = %device_id, deleted = deleted, "Deleted device");
        Ok(deleted > 0)
    }

    async fn list_by_brand(&self, brand: &str) -> DomainResult<Vec<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices
             WHERE brand = $1
             ORDER BY creation_time DESC"
        );
        let rows = conn
            .query(query.as_str(), &[&brand])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter()
            .map(|row| DeviceRow::from(row).try_into())
            .collect()
    }

    async fn list_by_state(&self, state: DeviceState) -> DomainResult<Vec<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices
             WHERE state = $1
             ORDER BY creation_time DESC"
        );
        let rows = conn
            .query(query.as_str(), &[&state.to_string()])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter()
            .map(|row| DeviceRow::from(row).try_into())
            .collect()
    }

    async fn list_page(&self, page: PageRequest) -> DomainResult<Vec<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // Sort key and direction come from closed enums, never from input.
        let column = match page.sort {
            DeviceSort::Name => "device_name",
            DeviceSort::Brand => "brand",
            DeviceSort::CreationTime => "creation_time",
        };
        let direction = match page.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };

        let query = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices
             ORDER BY {column} {direction}
             LIMIT $1 OFFSET $2"
        );
        let rows = conn
            .query(query.as_str(), &[&page.limit, &page.offset])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter()
            .map(|row| DeviceRow::from(row).try_into())
            .collect()
    }
}
