use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational state of a device. Only `InUse` carries special meaning for the
/// lifecycle engine: while a device is in use its name and brand are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Available,
    InUse,
    Inactive,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::Available => "AVAILABLE",
            DeviceState::InUse => "IN_USE",
            DeviceState::Inactive => "INACTIVE",
        };
        f.write_str(s)
    }
}

impl FromStr for DeviceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(DeviceState::Available),
            "IN_USE" => Ok(DeviceState::InUse),
            "INACTIVE" => Ok(DeviceState::Inactive),
            other => Err(format!("unknown device state: {other}")),
        }
    }
}

/// Domain representation of a device record.
///
/// `version` is the optimistic-concurrency token bumped by the repository on
/// every successful replace. It never leaves the service boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
    pub creation_time: DateTime<Utc>,
    pub version: i64,
}

/// Caller-facing input for creating a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDeviceInput {
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
}

/// Repository insert input: the engine stamps `creation_time`, the repository
/// assigns the identifier and the initial version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
    pub creation_time: DateTime<Utc>,
}

/// Full-replace candidate. Field presence is validated by the transport layer,
/// so all three mutable fields are required here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceDevice {
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
}

/// Presence-aware patch. An outer `Some` means the field was present in the
/// payload; absent fields are left untouched by the merge.
///
/// `creation_time` is immutable, but "omitted" and "explicitly targeted" must
/// be told apart so the latter can be rejected. The double option preserves
/// that distinction: `Some(None)` is a payload carrying an explicit null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub state: Option<DeviceState>,
    pub creation_time: Option<Option<DateTime<Utc>>>,
}

/// Sort key for paged listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSort {
    Name,
    Brand,
    CreationTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Bounded, ordered page request for `list_page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
    pub sort: DeviceSort,
    pub direction: SortDirection,
}
