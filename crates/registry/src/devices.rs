use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use gpio::{GpioError, LedController};
use shared::domain::{DeviceInfo, LedState};
use tracing::warn;

use crate::RegistryError;

const LED_DEVICE_TYPE: &str = "led";

/// An LED device: a stable identifier plus its controller.
pub struct LedDevice {
    device_id: String,
    controller: LedController,
}

impl std::fmt::Debug for LedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedDevice")
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

impl LedDevice {
    pub fn new(device_id: impl Into<String>, controller: LedController) -> Self {
        Self {
            device_id: device_id.into(),
            controller,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            device_id: self.device_id.clone(),
            device_type: LED_DEVICE_TYPE.to_string(),
        }
    }

    pub fn state(&self) -> LedState {
        self.controller.state()
    }

    pub fn set_power(&self, is_on: bool) -> Result<LedState, GpioError> {
        self.controller.set_power(is_on)
    }

    pub fn set_brightness(&self, brightness: f64) -> Result<LedState, GpioError> {
        self.controller.set_brightness(brightness)
    }

    pub fn close(&self) -> Result<(), GpioError> {
        self.controller.close()
    }
}

/// Concurrent device collection keyed by device id.
///
/// The single lock here guards membership only; state transitions stay
/// behind each controller's own lock.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: Mutex<HashMap<String, Arc<LedDevice>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<LedDevice>>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the device, replacing any existing entry with the same id.
    pub fn register_led(&self, device: LedDevice) {
        self.lock()
            .insert(device.device_id.clone(), Arc::new(device));
    }

    /// Metadata snapshot of every registered device.
    pub fn list_devices(&self) -> Vec<DeviceInfo> {
        self.lock().values().map(|device| device.info()).collect()
    }

    pub fn get_led(&self, device_id: &str) -> Result<Arc<LedDevice>, RegistryError> {
        self.lock()
            .get(device_id)
            .cloned()
            .ok_or_else(|| RegistryError::DeviceNotFound(device_id.to_string()))
    }

    /// Drains the registry and closes every device.
    ///
    /// The map is emptied under the membership lock, then the controllers
    /// are closed outside it so slow hardware teardown never blocks
    /// concurrent lookups. A device that fails to close is logged and does
    /// not stop the remaining teardown.
    pub fn close(&self) {
        let drained: Vec<Arc<LedDevice>> = {
            let mut devices = self.lock();
            devices.drain().map(|(_, device)| device).collect()
        };
        for device in drained {
            if let Err(error) = device.close() {
                warn!(device_id = %device.device_id(), %error, "failed to close device");
            }
        }
    }
}
