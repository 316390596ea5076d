//! Raspberry Pi PWM backend on top of rppal's software PWM.
//!
//! Compiled only with the `rpi` feature; the factory keeps this module out
//! of every other build so the mock path never needs the GPIO driver stack.
//! Pins use BCM numbering and the duty cycle is expressed 0..100 at the
//! contract boundary (rppal itself wants a 0..1 fraction).

use rppal::gpio::{Gpio, OutputPin};

use crate::{GpioError, PwmOutput};

#[derive(Debug)]
pub struct RpiPwmOutput {
    // Taken on close so the pin is released exactly once; rppal resets the
    // pin to its default state when the handle drops.
    pin: Option<OutputPin>,
    frequency_hz: f64,
    started: bool,
}

impl RpiPwmOutput {
    /// Binds the pin and frequency. Fails with `HardwareUnavailable` when
    /// the GPIO character device is missing, i.e. on anything that is not
    /// a Raspberry Pi.
    pub fn new(pin: u8, frequency_hz: u32) -> Result<Self, GpioError> {
        let gpio = Gpio::new().map_err(|e| GpioError::HardwareUnavailable(e.to_string()))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| GpioError::HardwareUnavailable(e.to_string()))?
            .into_output();
        Ok(Self {
            pin: Some(pin),
            frequency_hz: f64::from(frequency_hz),
            started: false,
        })
    }

    fn apply(&mut self, duty_cycle_percent: f64) -> Result<(), GpioError> {
        let frequency_hz = self.frequency_hz;
        let pin = self
            .pin
            .as_mut()
            .ok_or_else(|| GpioError::Hardware("PWM output already closed".to_string()))?;
        pin.set_pwm_frequency(frequency_hz, duty_cycle_percent / 100.0)
            .map_err(|e| GpioError::Hardware(e.to_string()))
    }
}

impl PwmOutput for RpiPwmOutput {
    fn start(&mut self, duty_cycle_percent: f64) -> Result<(), GpioError> {
        self.apply(duty_cycle_percent)?;
        self.started = true;
        Ok(())
    }

    fn change_duty_cycle(&mut self, duty_cycle_percent: f64) -> Result<(), GpioError> {
        // Software PWM restarts with the new duty, so the first change
        // behaves like start.
        self.apply(duty_cycle_percent)?;
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), GpioError> {
        let Some(pin) = self.pin.as_mut() else {
            return Ok(());
        };
        if self.started {
            pin.clear_pwm()
                .map_err(|e| GpioError::Hardware(e.to_string()))?;
        }
        pin.set_low();
        self.started = false;
        Ok(())
    }

    fn close(&mut self) -> Result<(), GpioError> {
        let stopped = self.stop();
        // The pin is released even when stop failed; a second close finds
        // it already gone and is a no-op.
        self.pin.take();
        stopped
    }
}
