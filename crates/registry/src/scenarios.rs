use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use shared::protocol::{Action, ExecutedAction, Scenario};

use crate::{devices::DeviceRegistry, RegistryError};

/// In-memory scenario store plus the replay engine.
#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: Mutex<HashMap<String, Scenario>>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Scenario>> {
        self.scenarios
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates or wholesale-replaces the scenario under its id.
    pub fn upsert(&self, scenario: Scenario) {
        self.lock().insert(scenario.scenario_id.clone(), scenario);
    }

    pub fn list(&self) -> Vec<Scenario> {
        self.lock().values().cloned().collect()
    }

    pub fn get(&self, scenario_id: &str) -> Result<Scenario, RegistryError> {
        self.lock()
            .get(scenario_id)
            .cloned()
            .ok_or_else(|| RegistryError::ScenarioNotFound(scenario_id.to_string()))
    }

    /// Replays the scenario's actions against the device registry, in
    /// stored order, and reports what actually ran.
    ///
    /// Actions with an empty device id or an unrecognized type are skipped
    /// so stored scenarios keep working as the action vocabulary grows. An
    /// action naming a device that is not registered aborts the remaining
    /// actions; already executed ones are not rolled back.
    pub fn trigger(
        &self,
        scenario_id: &str,
        devices: &DeviceRegistry,
    ) -> Result<Vec<ExecutedAction>, RegistryError> {
        let scenario = self.get(scenario_id)?;
        let mut executed = Vec::new();
        for action in &scenario.actions {
            match action {
                Action::SetPower { device_id, is_on } => {
                    let device_id = device_id.trim();
                    if device_id.is_empty() {
                        continue;
                    }
                    let state = devices.get_led(device_id)?.set_power(*is_on)?;
                    executed.push(ExecutedAction {
                        action_type: "set_power".to_string(),
                        device_id: device_id.to_string(),
                        state,
                    });
                }
                Action::SetBrightness {
                    device_id,
                    brightness,
                } => {
                    let device_id = device_id.trim();
                    if device_id.is_empty() {
                        continue;
                    }
                    let state = devices.get_led(device_id)?.set_brightness(*brightness)?;
                    executed.push(ExecutedAction {
                        action_type: "set_brightness".to_string(),
                        device_id: device_id.to_string(),
                        state,
                    });
                }
                Action::Unknown(_) => {}
            }
        }
        Ok(executed)
    }
}
