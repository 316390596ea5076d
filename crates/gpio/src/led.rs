//! LED driver on top of a PWM output.
//!
//! Brightness is held as a float in `[0, 1]`; the physical duty cycle is
//! derived as `brightness * 100`. Turning the LED off stops the PWM signal
//! and resets brightness to zero. The behavior is identical across
//! backends, which is what makes the controller testable without hardware.

use std::sync::{Mutex, MutexGuard, PoisonError};

use shared::domain::LedState;

use crate::{GpioError, PwmOutput};

/// On/off + brightness state machine over one exclusively owned PWM output.
///
/// Every transition is atomic under one per-controller lock, so concurrent
/// API calls serialize and `state()` never observes a half-applied change.
pub struct LedController {
    inner: Mutex<LedInner>,
}

struct LedInner {
    pwm: Box<dyn PwmOutput>,
    is_on: bool,
    brightness: f64,
}

impl LedInner {
    fn apply(&mut self) -> Result<(), GpioError> {
        let duty = self.brightness * 100.0;
        self.pwm.change_duty_cycle(duty)
    }

    fn state(&self) -> LedState {
        LedState {
            is_on: self.is_on,
            brightness: self.brightness,
        }
    }
}

impl LedController {
    pub fn new(pwm: Box<dyn PwmOutput>) -> Self {
        Self {
            inner: Mutex::new(LedInner {
                pwm,
                is_on: false,
                brightness: 0.0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedInner> {
        // A poisoned lock means a backend call panicked mid-transition; the
        // in-memory fields are already declared unspecified until the next
        // successful call, so recovering the guard is safe.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only snapshot of the current state.
    pub fn state(&self) -> LedState {
        self.lock().state()
    }

    /// Turns the LED on or off and returns the new state.
    ///
    /// The first power-on defaults to full brightness. Powering off is
    /// idempotent: it always ends at `{is_on: false, brightness: 0}`.
    pub fn set_power(&self, is_on: bool) -> Result<LedState, GpioError> {
        let mut inner = self.lock();
        if is_on {
            if inner.brightness <= 0.0 {
                inner.brightness = 1.0;
            }
            inner.apply()?;
            inner.is_on = true;
        } else {
            inner.pwm.stop()?;
            inner.is_on = false;
            inner.brightness = 0.0;
        }
        Ok(inner.state())
    }

    /// Sets the brightness, clamped to `[0, 1]`, and returns the new state.
    ///
    /// A clamped value of zero is treated as powering off.
    pub fn set_brightness(&self, brightness: f64) -> Result<LedState, GpioError> {
        let mut inner = self.lock();
        inner.brightness = brightness.clamp(0.0, 1.0);
        if inner.brightness == 0.0 {
            inner.pwm.stop()?;
            inner.is_on = false;
        } else {
            inner.apply()?;
            inner.is_on = true;
        }
        Ok(inner.state())
    }

    /// Stops the signal and releases the backend.
    ///
    /// `close` on the backend runs even when `stop` fails; the stop error
    /// wins when both fail.
    pub fn close(&self) -> Result<(), GpioError> {
        let mut inner = self.lock();
        let stopped = inner.pwm.stop();
        let closed = inner.pwm.close();
        stopped.and(closed)
    }
}
