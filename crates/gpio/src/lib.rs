//! Hardware boundary for the PWM-driven LED output.
//!
//! The service supports two environments: real Raspberry Pi hardware (the
//! `rpi` feature, via rppal) and everything else (an in-memory mock), both
//! behind the [`PwmOutput`] contract so controllers, registries and the API
//! never know which one they are driving.

use thiserror::Error;

pub mod factory;
pub mod led;
pub mod mock;
#[cfg(feature = "rpi")]
pub mod rpi;

pub use factory::create_pwm_output;
pub use led::LedController;
pub use mock::MockPwmOutput;

#[derive(Debug, Error)]
pub enum GpioError {
    /// Backend name not known to the factory. Fatal at composition time.
    #[error("unsupported GPIO backend '{0}'")]
    UnsupportedBackend(String),
    /// The GPIO driver could not be loaded or initialized on this machine.
    #[error("GPIO hardware unavailable: {0}")]
    HardwareUnavailable(String),
    /// A PWM operation failed after construction.
    #[error("PWM operation failed: {0}")]
    Hardware(String),
}

/// Output pin with PWM support.
///
/// Minimal contract every GPIO backend has to satisfy. The methods follow
/// the PWM lifecycle: `start` begins signal generation, `change_duty_cycle`
/// updates the duty (backends may auto-start on the first change), `stop`
/// drives the output to zero, `close` releases hardware resources.
pub trait PwmOutput: Send + std::fmt::Debug {
    fn start(&mut self, duty_cycle_percent: f64) -> Result<(), GpioError>;

    fn change_duty_cycle(&mut self, duty_cycle_percent: f64) -> Result<(), GpioError>;

    fn stop(&mut self) -> Result<(), GpioError>;

    fn close(&mut self) -> Result<(), GpioError>;
}
