use async_trait::async_trait;

use crate::device::{Device, DeviceState, NewDevice, PageRequest};
use crate::error::DomainResult;

/// Repository trait for device storage operations.
/// Infrastructure layers (e.g. fleet-postgres) implement this trait; the
/// engine never consults it for business meaning.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Persist a new device, assigning its identifier and initial version.
    async fn insert_device(&self, input: NewDevice) -> DomainResult<Device>;

    /// Fetch a device by ID.
    async fn find_device(&self, device_id: &str) -> DomainResult<Option<Device>>;

    /// Atomic full overwrite, conditioned on `device.version` matching the
    /// stored token. A mismatch (or concurrent deletion) fails with
    /// `DomainError::ConcurrentModification`. Returns the record with the
    /// bumped version.
    async fn replace_device(&self, device: Device) -> DomainResult<Device>;

    /// Physical removal. Returns `false` when no record exists at the ID.
    async fn delete_device(&self, device_id: &str) -> DomainResult<bool>;

    /// All devices of a brand, newest first.
    async fn list_by_brand(&self, brand: &str) -> DomainResult<Vec<Device>>;

    /// All devices in a state, newest first.
    async fn list_by_state(&self, state: DeviceState) -> DomainResult<Vec<Device>>;

    /// A bounded, ordered page of devices.
    async fn list_page(&self, page: PageRequest) -> DomainResult<Vec<Device>>;
}
