use serde::{Deserialize, Serialize};

/// Snapshot of a dimmable LED.
///
/// `brightness` is always normalized to `[0, 1]`; `is_on` is true exactly
/// when `brightness > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedState {
    pub is_on: bool,
    pub brightness: f64,
}

/// Public metadata for a registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub device_type: String,
}
