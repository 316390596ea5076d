//! Maps a backend name from configuration to a boxed [`PwmOutput`].

use crate::{mock::MockPwmOutput, GpioError, PwmOutput};

/// Creates the PWM output for the selected backend.
///
/// The name is trimmed and lowercased so env values are forgiving. An
/// unknown name is a configuration error; the composition root turns it
/// into a startup failure before the service accepts traffic.
pub fn create_pwm_output(
    backend: &str,
    pin: u8,
    frequency_hz: u32,
) -> Result<Box<dyn PwmOutput>, GpioError> {
    match backend.trim().to_ascii_lowercase().as_str() {
        // The mock needs neither a pin nor a frequency.
        "mock" => Ok(Box::new(MockPwmOutput::new())),
        "rpi" => create_rpi(pin, frequency_hz),
        other => Err(GpioError::UnsupportedBackend(other.to_string())),
    }
}

#[cfg(feature = "rpi")]
fn create_rpi(pin: u8, frequency_hz: u32) -> Result<Box<dyn PwmOutput>, GpioError> {
    Ok(Box::new(crate::rpi::RpiPwmOutput::new(pin, frequency_hz)?))
}

#[cfg(not(feature = "rpi"))]
fn create_rpi(_pin: u8, _frequency_hz: u32) -> Result<Box<dyn PwmOutput>, GpioError> {
    Err(GpioError::HardwareUnavailable(
        "this build does not include the 'rpi' feature".to_string(),
    ))
}
