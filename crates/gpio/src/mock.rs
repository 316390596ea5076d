//! In-memory PWM backend for development, CI and tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{GpioError, PwmOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmCall {
    Start,
    ChangeDutyCycle,
    Stop,
    Close,
}

#[derive(Debug, Clone, Default)]
pub struct MockPwmState {
    pub started: bool,
    pub duty_cycle_percent: f64,
    /// Ordered record of every contract call received.
    pub calls: Vec<PwmCall>,
}

/// Virtual PWM output that only mutates memory.
///
/// State lives behind a shared handle: clones observe the same backend, so
/// a test can keep a clone while a controller owns the boxed original.
/// Every operation is atomic under the handle's own lock.
#[derive(Debug, Clone, Default)]
pub struct MockPwmOutput {
    state: Arc<Mutex<MockPwmState>>,
}

impl MockPwmOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MockPwmState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockPwmState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PwmOutput for MockPwmOutput {
    fn start(&mut self, duty_cycle_percent: f64) -> Result<(), GpioError> {
        let mut state = self.lock();
        state.started = true;
        state.duty_cycle_percent = duty_cycle_percent;
        state.calls.push(PwmCall::Start);
        Ok(())
    }

    fn change_duty_cycle(&mut self, duty_cycle_percent: f64) -> Result<(), GpioError> {
        let mut state = self.lock();
        // Real PWM peripherals often reject a duty change before start, so
        // the mock mirrors the hardware backend and auto-starts instead.
        state.started = true;
        state.duty_cycle_percent = duty_cycle_percent;
        state.calls.push(PwmCall::ChangeDutyCycle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), GpioError> {
        let mut state = self.lock();
        state.started = false;
        state.duty_cycle_percent = 0.0;
        state.calls.push(PwmCall::Stop);
        Ok(())
    }

    fn close(&mut self) -> Result<(), GpioError> {
        // Nothing to release; only the call is recorded.
        self.lock().calls.push(PwmCall::Close);
        Ok(())
    }
}
