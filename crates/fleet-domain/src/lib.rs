pub mod device;
pub mod device_service;
pub mod error;
pub mod in_memory_device_repository;
pub mod repository;

pub use device::*;
pub use device_service::DeviceService;
pub use error::{DomainError, DomainResult};
pub use in_memory_device_repository::InMemoryDeviceRepository;
pub use repository::DeviceRepository;

// Re-export the repository mock when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use repository::MockDeviceRepository;
