use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use fleet_domain::{
    CreateDeviceInput, Device, DevicePatch, DeviceState, ReplaceDevice,
};

/// Create payload. `state` deserializes through the closed enum, so an
/// out-of-set value is rejected before the engine runs.
#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
}

impl From<CreateDeviceRequest> for CreateDeviceInput {
    fn from(req: CreateDeviceRequest) -> Self {
        CreateDeviceInput {
            name: req.name,
            brand: req.brand,
            state: req.state,
        }
    }
}

/// Full-replace payload. A caller-supplied `creationTime` is accepted by the
/// deserializer for wire compatibility and then discarded: the engine never
/// sees it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceDeviceRequest {
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
}

impl From<ReplaceDeviceRequest> for ReplaceDevice {
    fn from(req: ReplaceDeviceRequest) -> Self {
        ReplaceDevice {
            name: req.name,
            brand: req.brand,
            state: req.state,
        }
    }
}

/// Patch payload. Every field is presence-aware: absent fields stay `None`
/// and are left untouched by the merge. `creationTime` keeps the double
/// option so "present but null" is still recognized as targeting the field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDeviceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub state: Option<DeviceState>,
    #[serde(default, deserialize_with = "double_option")]
    pub creation_time: Option<Option<DateTime<Utc>>>,
}

impl From<PatchDeviceRequest> for DevicePatch {
    fn from(req: PatchDeviceRequest) -> Self {
        DevicePatch {
            name: req.name,
            brand: req.brand,
            state: req.state,
            creation_time: req.creation_time,
        }
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Wire representation of a device. The version token is internal and never
/// serialized.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
    pub creation_time: DateTime<Utc>,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        DeviceResponse {
            id: device.id,
            name: device.name,
            brand: device.brand,
            state: device.state,
            creation_time: device.creation_time,
        }
    }
}

/// Standard list response body.
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub items: Vec<DeviceResponse>,
    pub total: usize,
}

impl DeviceListResponse {
    pub fn from_devices(devices: Vec<Device>) -> Self {
        let items: Vec<DeviceResponse> = devices.into_iter().map(DeviceResponse::from).collect();
        let total = items.len();
        DeviceListResponse { items, total }
    }
}
