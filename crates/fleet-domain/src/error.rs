use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device is in use: {0}")]
    DeviceInUse(String),

    #[error("Invalid device ID: {0}")]
    InvalidDeviceId(String),

    #[error("Invalid device name: {0}")]
    InvalidDeviceName(String),

    #[error("Invalid device brand: {0}")]
    InvalidDeviceBrand(String),

    #[error("Creation time cannot be updated: {0}")]
    CreationTimeImmutable(String),

    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    #[error("Concurrent modification of device: {0}")]
    ConcurrentModification(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
