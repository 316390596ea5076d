use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DeviceInfo, LedState};

/// One step of a scenario, addressed to a single device.
///
/// The wire shape is a flat object tagged by `type`. Anything with an
/// unrecognized tag decodes into [`Action::Unknown`] and is carried along
/// untouched, so stored scenarios survive additions to the action
/// vocabulary. Missing fields default instead of failing for the same
/// reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SetPower {
        #[serde(default)]
        device_id: String,
        #[serde(default)]
        is_on: bool,
    },
    SetBrightness {
        #[serde(default)]
        device_id: String,
        #[serde(default)]
        brightness: f64,
    },
    #[serde(untagged)]
    Unknown(serde_json::Value),
}

/// A named, ordered list of device actions, replayed on demand.
///
/// Scenarios are replaced as a whole unit; there are no partial edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: String,
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioUpsertRequest {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Record of one dispatched scenario action and the state it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub device_id: String,
    pub state: LedState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerOutcome {
    pub scenario_id: String,
    pub executed: Vec<ExecutedAction>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetPowerRequest {
    pub is_on: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetBrightnessRequest {
    pub brightness: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub service: String,
    pub uptime_s: f64,
    pub started_at: DateTime<Utc>,
    pub gpio_backend: String,
    pub devices: Vec<DeviceInfo>,
    pub led_states: HashMap<String, LedState>,
}
