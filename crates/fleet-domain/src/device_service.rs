use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::device::{
    CreateDeviceInput, Device, DevicePatch, DeviceSort, DeviceState, NewDevice, PageRequest,
    ReplaceDevice, SortDirection,
};
use crate::error::{DomainError, DomainResult};
use crate::repository::DeviceRepository;

const MAX_PAGE_SIZE: i64 = 200;

/// Domain service for the device lifecycle: creation defaulting, full replace,
/// partial merge, deletion gating and filtered retrieval. Handlers call this;
/// all state lives in the repository.
///
/// Every rule is checked before any write, so mutating operations are
/// all-or-nothing with respect to business-rule violations. The version read
/// with the record is carried into the conditional write, which is what makes
/// the read-then-write race-safe.
pub struct DeviceService {
    repository: Arc<dyn DeviceRepository>,
}

impl DeviceService {
    pub fn new(repository: Arc<dyn DeviceRepository>) -> Self {
        Self { repository }
    }

    /// Create a new device. The creation time is stamped here and the
    /// repository assigns the identifier; nothing a caller supplies can reach
    /// either field.
    pub async fn create_device(&self, input: CreateDeviceInput) -> DomainResult<Device> {
        validate_name(&input.name)?;
        validate_brand(&input.brand)?;

        debug!(name = %input.name, brand = %input.brand, "Creating device");

        let device = self
            .repository
            .insert_device(NewDevice {
                name: input.name,
                brand: input.brand,
                state: input.state,
                creation_time: Utc::now(),
            })
            .await?;

        info!(device_id = %device.id, "Device created successfully");
        Ok(device)
    }

    /// Get a device by ID.
    pub async fn get_device(&self, device_id: &str) -> DomainResult<Device> {
        validate_id(device_id)?;

        debug!(device_id = %device_id, "Getting device");

        self.repository
            .find_device(device_id)
            .await?
            .ok_or_else(|| DomainError::DeviceNotFound(device_id.to_string()))
    }

    /// Full update. A replace candidate always targets name and brand, so a
    /// device currently in use rejects the whole operation.
    pub async fn replace_device(
        &self,
        device_id: &str,
        candidate: ReplaceDevice,
    ) -> DomainResult<Device> {
        debug!(device_id = %device_id, "Replacing device");

        let current = self.load(device_id).await?;

        if current.state == DeviceState::InUse {
            warn!(device_id = %device_id, "Rejected replace of in-use device");
            return Err(DomainError::DeviceInUse(device_id.to_string()));
        }

        validate_name(&candidate.name)?;
        validate_brand(&candidate.brand)?;

        // id, creation_time and the version token are retained from the
        // stored record; the candidate cannot touch them.
        let updated = self
            .repository
            .replace_device(Device {
                name: candidate.name,
                brand: candidate.brand,
                state: candidate.state,
                ..current
            })
            .await?;

        info!(device_id = %updated.id, "Device replaced successfully");
        Ok(updated)
    }

    /// Merge semantics: only fields present in the patch are applied. A patch
    /// targeting name or brand while the device is in use aborts before
    /// anything is written; a state change alone is always allowed (the freeze
    /// guards on the current state, not the new one).
    pub async fn patch_device(&self, device_id: &str, patch: DevicePatch) -> DomainResult<Device> {
        debug!(device_id = %device_id, "Patching device");

        let mut current = self.load(device_id).await?;

        // "Present but null" still counts as targeting the field.
        if patch.creation_time.is_some() {
            warn!(device_id = %device_id, "Rejected patch targeting creation time");
            return Err(DomainError::CreationTimeImmutable(device_id.to_string()));
        }

        let frozen = current.state == DeviceState::InUse;
        if frozen && (patch.name.is_some() || patch.brand.is_some()) {
            warn!(device_id = %device_id, "Rejected patch of in-use device");
            return Err(DomainError::DeviceInUse(device_id.to_string()));
        }

        if let Some(name) = patch.name {
            validate_name(&name)?;
            current.name = name;
        }
        if let Some(brand) = patch.brand {
            validate_brand(&brand)?;
            current.brand = brand;
        }
        if let Some(state) = patch.state {
            current.state = state;
        }

        let updated = self.repository.replace_device(current).await?;

        info!(device_id = %updated.id, "Device patched successfully");
        Ok(updated)
    }

    /// Delete a device, unless it is in use.
    pub async fn delete_device(&self, device_id: &str) -> DomainResult<()> {
        debug!(device_id = %device_id, "Deleting device");

        let current = self.load(device_id).await?;

        if current.state == DeviceState::InUse {
            warn!(device_id = %device_id, "Rejected delete of in-use device");
            return Err(DomainError::DeviceInUse(device_id.to_string()));
        }

        let deleted = self.repository.delete_device(device_id).await?;
        if !deleted {
            // Removed between the read and the delete.
            return Err(DomainError::DeviceNotFound(device_id.to_string()));
        }

        info!(device_id = %device_id, "Device deleted successfully");
        Ok(())
    }

    /// All devices of a brand, newest first.
    pub async fn list_by_brand(&self, brand: &str) -> DomainResult<Vec<Device>> {
        debug!(brand = %brand, "Listing devices by brand");

        let devices = self.repository.list_by_brand(brand).await?;

        info!(count = devices.len(), "Listed devices by brand");
        Ok(devices)
    }

    /// All devices in a state, newest first.
    pub async fn list_by_state(&self, state: DeviceState) -> DomainResult<Vec<Device>> {
        debug!(state = %state, "Listing devices by state");

        let devices = self.repository.list_by_state(state).await?;

        info!(count = devices.len(), "Listed devices by state");
        Ok(devices)
    }

    /// A bounded, ordered page of devices.
    pub async fn list_page(
        &self,
        page: i64,
        size: i64,
        sort: DeviceSort,
        direction: SortDirection,
    ) -> DomainResult<Vec<Device>> {
        if page < 0 {
            return Err(DomainError::InvalidPageRequest(format!(
                "page index must not be negative, got {page}"
            )));
        }
        if size < 1 || size > MAX_PAGE_SIZE {
            return Err(DomainError::InvalidPageRequest(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
            )));
        }

        debug!(page = page, size = size, "Listing device page");

        let devices = self
            .repository
            .list_page(PageRequest {
                offset: page * size,
                limit: size,
                sort,
                direction,
            })
            .await?;

        info!(count = devices.len(), "Listed device page");
        Ok(devices)
    }

    async fn load(&self, device_id: &str) -> DomainResult<Device> {
        validate_id(device_id)?;
        self.repository
            .find_device(device_id)
            .await?
            .ok_or_else(|| {
                warn!(device_id = %device_id, "Device not found");
                DomainError::DeviceNotFound(device_id.to_string())
            })
    }
}

fn validate_id(device_id: &str) -> DomainResult<()> {
    if device_id.is_empty() {
        return Err(DomainError::InvalidDeviceId(
            "Device ID cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidDeviceName(
            "Device name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_brand(brand: &str) -> DomainResult<()> {
    if brand.trim().is_empty() {
        return Err(DomainError::InvalidDeviceBrand(
            "Device brand cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockDeviceRepository;
    use chrono::{DateTime, TimeZone, Utc};

    fn stored_device(state: DeviceState) -> Device {
        Device {
            id: "device-123".to_string(),
            name: "iPhone 16".to_string(),
            brand: "Apple".to_string(),
            state,
            creation_time: fixed_time(),
            version: 3,
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_device_stamps_creation_time() {
        let mut mock_repo = MockDeviceRepository::new();

        let before = Utc::now();
        mock_repo
            .expect_insert_device()
            .withf(move |input: &NewDevice| {
                input.name == "iPhone 16"
                    && input.brand == "Apple"
                    && input.state == DeviceState::Available
                    && input.creation_time >= before
            })
            .times(1)
            .return_once(|input| {
                Ok(Device {
                    id: "device-123".to_string(),
                    name: input.name,
                    brand: input.brand,
                    state: input.state,
                    creation_time: input.creation_time,
                    version: 0,
                })
            });

        let service = DeviceService::new(Arc::new(mock_repo));
        let device = service
            .create_device(CreateDeviceInput {
                name: "iPhone 16".to_string(),
                brand: "Apple".to_string(),
                state: DeviceState::Available,
            })
            .await
            .unwrap();

        assert!(!device.id.is_empty());
        assert!(device.creation_time <= Utc::now());
    }

    #[tokio::test]
    async fn create_device_rejects_empty_name() {
        let service = DeviceService::new(Arc::new(MockDeviceRepository::new()));

        let result = service
            .create_device(CreateDeviceInput {
                name: "   ".to_string(),
                brand: "Apple".to_string(),
                state: DeviceState::Available,
            })
            .await;

        assert!(matches!(result, Err(DomainError::InvalidDeviceName(_))));
    }

    #[tokio::test]
    async fn create_device_rejects_empty_brand() {
        let service = DeviceService::new(Arc::new(MockDeviceRepository::new()));

        let result = service
            .create_device(CreateDeviceInput {
                name: "iPhone 16".to_string(),
                brand: "".to_string(),
                state: DeviceState::Available,
            })
            .await;

        assert!(matches!(result, Err(DomainError::InvalidDeviceBrand(_))));
    }

    #[tokio::test]
    async fn get_device_not_found() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(None));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service.get_device("missing").await;

        assert!(matches!(result, Err(DomainError::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn get_device_rejects_empty_id() {
        let service = DeviceService::new(Arc::new(MockDeviceRepository::new()));
        let result = service.get_device("").await;

        assert!(matches!(result, Err(DomainError::InvalidDeviceId(_))));
    }

    #[tokio::test]
    async fn replace_device_keeps_id_creation_time_and_version() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::Available))));
        mock_repo
            .expect_replace_device()
            .withf(|device: &Device| {
                device.id == "device-123"
                    && device.name == "iPhone 16 Pro"
                    && device.state == DeviceState::InUse
                    && device.creation_time == fixed_time()
                    && device.version == 3
            })
            .times(1)
            .return_once(|device| {
                Ok(Device {
                    version: device.version + 1,
                    ..device
                })
            });

        let service = DeviceService::new(Arc::new(mock_repo));
        let updated = service
            .replace_device(
                "device-123",
                ReplaceDevice {
                    name: "iPhone 16 Pro".to_string(),
                    brand: "Apple".to_string(),
                    state: DeviceState::InUse,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.creation_time, fixed_time());
        assert_eq!(updated.version, 4);
    }

    #[tokio::test]
    async fn replace_device_rejects_in_use_device() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::InUse))));
        // No replace expectation: the write must never happen.

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service
            .replace_device(
                "device-123",
                ReplaceDevice {
                    name: "iPhone 16".to_string(),
                    brand: "Apple".to_string(),
                    state: DeviceState::Available,
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::DeviceInUse(_))));
    }

    #[tokio::test]
    async fn replace_device_not_found() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(None));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service
            .replace_device(
                "missing",
                ReplaceDevice {
                    name: "iPhone 16".to_string(),
                    brand: "Apple".to_string(),
                    state: DeviceState::Available,
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn replace_device_propagates_version_conflict() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::Available))));
        mock_repo
            .expect_replace_device()
            .times(1)
            .return_once(|device| Err(DomainError::ConcurrentModification(device.id)));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service
            .replace_device(
                "device-123",
                ReplaceDevice {
                    name: "iPhone 16 Pro".to_string(),
                    brand: "Apple".to_string(),
                    state: DeviceState::Available,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(DomainError::ConcurrentModification(_))
        ));
    }

    #[tokio::test]
    async fn patch_device_applies_only_present_fields() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::Available))));
        mock_repo
            .expect_replace_device()
            .withf(|device: &Device| {
                device.name == "iPhone 16 Mini"
                    && device.brand == "Apple"
                    && device.state == DeviceState::Available
                    && device.creation_time == fixed_time()
            })
            .times(1)
            .return_once(|device| Ok(device));

        let service = DeviceService::new(Arc::new(mock_repo));
        let updated = service
            .patch_device(
                "device-123",
                DevicePatch {
                    name: Some("iPhone 16 Mini".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.brand, "Apple");
    }

    #[tokio::test]
    async fn patch_device_rejects_name_change_while_in_use() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::InUse))));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service
            .patch_device(
                "device-123",
                DevicePatch {
                    name: Some("X".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::DeviceInUse(_))));
    }

    #[tokio::test]
    async fn patch_device_rejects_brand_change_while_in_use_even_if_unchanged() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::InUse))));

        let service = DeviceService::new(Arc::new(mock_repo));
        // Same value as stored: presence counts, not inequality.
        let result = service
            .patch_device(
                "device-123",
                DevicePatch {
                    brand: Some("Apple".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::DeviceInUse(_))));
    }

    #[tokio::test]
    async fn patch_device_allows_state_transition_out_of_in_use() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::InUse))));
        mock_repo
            .expect_replace_device()
            .withf(|device: &Device| {
                device.state == DeviceState::Available && device.name == "iPhone 16"
            })
            .times(1)
            .return_once(|device| Ok(device));

        let service = DeviceService::new(Arc::new(mock_repo));
        let updated = service
            .patch_device(
                "device-123",
                DevicePatch {
                    state: Some(DeviceState::Available),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.state, DeviceState::Available);
    }

    #[tokio::test]
    async fn patch_device_rejects_explicit_creation_time() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::Available))));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service
            .patch_device(
                "device-123",
                DevicePatch {
                    creation_time: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::CreationTimeImmutable(_))));
    }

    #[tokio::test]
    async fn patch_device_rejects_explicit_null_creation_time() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::Available))));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service
            .patch_device(
                "device-123",
                DevicePatch {
                    creation_time: Some(None),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::CreationTimeImmutable(_))));
    }

    #[tokio::test]
    async fn patch_device_rejects_empty_name() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::Available))));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service
            .patch_device(
                "device-123",
                DevicePatch {
                    name: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::InvalidDeviceName(_))));
    }

    #[tokio::test]
    async fn delete_device_rejects_in_use_device() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::InUse))));
        // No delete expectation: the removal must never happen.

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service.delete_device("device-123").await;

        assert!(matches!(result, Err(DomainError::DeviceInUse(_))));
    }

    #[tokio::test]
    async fn delete_device_success() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(Some(stored_device(DeviceState::Inactive))));
        mock_repo
            .expect_delete_device()
            .times(1)
            .return_once(|_| Ok(true));

        let service = DeviceService::new(Arc::new(mock_repo));
        assert!(service.delete_device("device-123").await.is_ok());
    }

    #[tokio::test]
    async fn delete_device_not_found() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_find_device()
            .times(1)
            .return_once(|_| Ok(None));

        let service = DeviceService::new(Arc::new(mock_repo));
        let result = service.delete_device("missing").await;

        assert!(matches!(result, Err(DomainError::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn list_page_rejects_negative_page() {
        let service = DeviceService::new(Arc::new(MockDeviceRepository::new()));
        let result = service
            .list_page(-1, 20, DeviceSort::CreationTime, SortDirection::Desc)
            .await;

        assert!(matches!(result, Err(DomainError::InvalidPageRequest(_))));
    }

    #[tokio::test]
    async fn list_page_rejects_oversized_page() {
        let service = DeviceService::new(Arc::new(MockDeviceRepository::new()));
        let result = service
            .list_page(0, 10_000, DeviceSort::CreationTime, SortDirection::Desc)
            .await;

        assert!(matches!(result, Err(DomainError::InvalidPageRequest(_))));
    }

    #[tokio::test]
    async fn list_page_converts_page_index_to_offset() {
        let mut mock_repo = MockDeviceRepository::new();
        mock_repo
            .expect_list_page()
            .withf(|page: &PageRequest| page.offset == 40 && page.limit == 20)
            .times(1)
            .return_once(|_| Ok(vec![]));

        let service = DeviceService::new(Arc::new(mock_repo));
        let devices = service
            .list_page(2, 20, DeviceSort::Name, SortDirection::Asc)
            .await
            .unwrap();

        assert!(devices.is_empty());
    }
}
