//! Transport-agnostic operations over the device and scenario registries.
//!
//! Handlers (HTTP today, anything else tomorrow) call these functions and
//! only translate the resulting [`ApiError`] into their own status codes.

use std::sync::Arc;

use gpio::GpioError;
use registry::{DeviceRegistry, RegistryError, ScenarioRegistry};
use shared::{
    domain::{DeviceInfo, LedState},
    error::{ApiError, ErrorCode},
    protocol::{Action, Scenario, TriggerOutcome},
};

/// Everything an operation needs, assembled once by the composition root
/// and passed by reference into every handler and test.
#[derive(Clone)]
pub struct ApiContext {
    pub devices: Arc<DeviceRegistry>,
    pub scenarios: Arc<ScenarioRegistry>,
}

pub fn list_devices(ctx: &ApiContext) -> Vec<DeviceInfo> {
    ctx.devices.list_devices()
}

pub fn device_state(ctx: &ApiContext, device_id: &str) -> Result<LedState, ApiError> {
    Ok(ctx
        .devices
        .get_led(device_id)
        .map_err(from_registry)?
        .state())
}

pub fn set_device_power(
    ctx: &ApiContext,
    device_id: &str,
    is_on: bool,
) -> Result<LedState, ApiError> {
    ctx.devices
        .get_led(device_id)
        .map_err(from_registry)?
        .set_power(is_on)
        .map_err(hardware)
}

pub fn set_device_brightness(
    ctx: &ApiContext,
    device_id: &str,
    brightness: f64,
) -> Result<LedState, ApiError> {
    ctx.devices
        .get_led(device_id)
        .map_err(from_registry)?
        .set_brightness(brightness)
        .map_err(hardware)
}

pub fn list_scenarios(ctx: &ApiContext) -> Vec<Scenario> {
    ctx.scenarios.list()
}

pub fn upsert_scenario(
    ctx: &ApiContext,
    scenario_id: &str,
    name: &str,
    actions: Vec<Action>,
) -> Result<Scenario, ApiError> {
    let scenario_id = scenario_id.trim();
    if scenario_id.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "scenario id cannot be empty",
        ));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "scenario name cannot be empty",
        ));
    }

    let scenario = Scenario {
        scenario_id: scenario_id.to_string(),
        name: name.to_string(),
        actions,
    };
    ctx.scenarios.upsert(scenario.clone());
    Ok(scenario)
}

pub fn trigger_scenario(ctx: &ApiContext, scenario_id: &str) -> Result<TriggerOutcome, ApiError> {
    let executed = ctx
        .scenarios
        .trigger(scenario_id, &ctx.devices)
        .map_err(from_registry)?;
    Ok(TriggerOutcome {
        scenario_id: scenario_id.to_string(),
        executed,
    })
}

fn from_registry(err: RegistryError) -> ApiError {
    match err {
        RegistryError::DeviceNotFound(_) | RegistryError::ScenarioNotFound(_) => {
            ApiError::new(ErrorCode::NotFound, err.to_string())
        }
        RegistryError::Gpio(inner) => hardware(inner),
    }
}

fn hardware(err: GpioError) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpio::{LedController, MockPwmOutput};
    use registry::LedDevice;

    fn setup() -> ApiContext {
        let devices = DeviceRegistry::new();
        devices.register_led(LedDevice::new(
            "nightlight",
            LedController::new(Box::new(MockPwmOutput::new())),
        ));
        ApiContext {
            devices: Arc::new(devices),
            scenarios: Arc::new(ScenarioRegistry::new()),
        }
    }

    #[test]
    fn unknown_device_maps_to_not_found() {
        let ctx = setup();
        let err = device_state(&ctx, "missing").expect_err("must fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn power_and_brightness_round_trip() {
        let ctx = setup();
        let state = set_device_power(&ctx, "nightlight", true).expect("power on");
        assert!(state.is_on);
        assert_eq!(state.brightness, 1.0);

        let state = set_device_brightness(&ctx, "nightlight", 0.4).expect("brightness");
        assert_eq!(state.brightness, 0.4);
        assert_eq!(device_state(&ctx, "nightlight").expect("state"), state);
    }

    #[test]
    fn upsert_rejects_blank_name() {
        let ctx = setup();
        let err = upsert_scenario(&ctx, "evening", "   ", Vec::new()).expect_err("must fail");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[test]
    fn upsert_trims_the_scenario_id() {
        let ctx = setup();
        let scenario =
            upsert_scenario(&ctx, " evening ", "Evening", Vec::new()).expect("upsert");
        assert_eq!(scenario.scenario_id, "evening");
        assert_eq!(list_scenarios(&ctx).len(), 1);
    }

    #[test]
    fn trigger_reports_executed_actions() {
        let ctx = setup();
        let actions: Vec<Action> = serde_json::from_value(serde_json::json!([
            {"type": "set_power", "device_id": "nightlight", "is_on": true},
            {"type": "set_brightness", "device_id": "nightlight", "brightness": 0.25},
        ]))
        .expect("actions");
        upsert_scenario(&ctx, "evening", "Evening", actions).expect("upsert");

        let outcome = trigger_scenario(&ctx, "evening").expect("trigger");
        assert_eq!(outcome.scenario_id, "evening");
        assert_eq!(outcome.executed.len(), 2);
        assert_eq!(outcome.executed[1].state.brightness, 0.25);
    }

    #[test]
    fn trigger_unknown_scenario_maps_to_not_found() {
        let ctx = setup();
        let err = trigger_scenario(&ctx, "missing").expect_err("must fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
