//! In-memory state layer: the device and scenario registries.
//!
//! Everything here is process-local and resets on restart. Each registry
//! has one lock guarding membership; device state transitions are guarded
//! separately inside each controller, and a membership lock is never held
//! across a backend call.

use thiserror::Error;

pub mod devices;
pub mod scenarios;

pub use devices::{DeviceRegistry, LedDevice};
pub use scenarios::ScenarioRegistry;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),
    #[error(transparent)]
    Gpio(#[from] gpio::GpioError),
}
