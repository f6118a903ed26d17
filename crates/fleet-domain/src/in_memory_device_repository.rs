use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::device::{Device, DeviceSort, DeviceState, NewDevice, PageRequest, SortDirection};
use crate::error::{DomainError, DomainResult};
use crate::repository::DeviceRepository;

/// In-memory implementation of DeviceRepository using a HashMap.
/// Used by tests and for local runs without a database. Identifiers are
/// assigned with xid, matching the PostgreSQL implementation.
pub struct InMemoryDeviceRepository {
    devices: Arc<RwLock<HashMap<String, Device>>>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryDeviceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn insert_device(&self, input: NewDevice) -> DomainResult<Device> {
        let device = Device {
            id: xid::new().to_string(),
            name: input.name,
            brand: input.brand,
            state: input.state,
            creation_time: input.creation_time,
            version: 0,
        };

        let mut devices = self.devices.write().await;
        devices.insert(device.id.clone(), device.clone());
        Ok(device)
    }

    async fn find_device(&self, device_id: &str) -> DomainResult<Option<Device>> {
        let devices = self.devices.read().await;
        Ok(devices.get(device_id).cloned())
    }

    async fn replace_device(&self, device: Device) -> DomainResult<Device> {
        let mut devices = self.devices.write().await;

        let stored = devices
            .get(&device.id)
            .ok_or_else(|| DomainError::ConcurrentModification(device.id.clone()))?;
        if stored.version != device.version {
            return Err(DomainError::ConcurrentModification(device.id.clone()));
        }

        let updated = Device {
            version: device.version + 1,
            ..device
        };
        devices.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    async fn delete_device(&self, device_id: &str) -> DomainResult<bool> {
        let mut devices = self.devices.write().await;
        Ok(devices.remove(device_id).is_some())
    }

    async fn list_by_brand(&self, brand: &str) -> DomainResult<Vec<Device>> {
        let devices = self.devices.read().await;
        let mut matched: Vec<Device> = devices
            .values()
            .filter(|d| d.brand == brand)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.creation_time.cmp(&a.creation_time));
        Ok(matched)
    }

    async fn list_by_state(&self, state: DeviceState) -> DomainResult<Vec<Device>> {
        let devices = self.devices.read().await;
        let mut matched: Vec<Device> = devices
            .values()
            .filter(|d| d.state == state)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.creation_time.cmp(&a.creation_time));
        Ok(matched)
    }

    async fn list_page(&self, page: PageRequest) -> DomainResult<Vec<Device>> {
        let devices = self.devices.read().await;
        let mut all: Vec<Device> = devices.values().cloned().collect();

        all.sort_by(|a, b| {
            let ordering = match page.sort {
                DeviceSort::Name => a.name.cmp(&b.name),
                DeviceSort::Brand => a.brand.cmp(&b.brand),
                DeviceSort::CreationTime => a.creation_time.cmp(&b.creation_time),
            };
            match page.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }
}
