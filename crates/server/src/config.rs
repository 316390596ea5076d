use std::{collections::HashMap, fs};

use anyhow::bail;

/// Minimum length enforced for the shared API token.
pub const MIN_API_TOKEN_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub api_token: String,
    pub gpio_backend: String,
    pub led_gpio_pin: u8,
    pub pwm_frequency_hz: u32,
    pub device_id: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8443".into(),
            api_token: String::new(),
            gpio_backend: "mock".into(),
            led_gpio_pin: 18,
            pwm_frequency_hz: 800,
            device_id: "nightlight".into(),
            log_filter: "info".into(),
        }
    }
}

/// Layers settings: defaults, then an optional `nightlight.toml` next to
/// the process, then `NIGHTLIGHT_*` environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("nightlight.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_file(&mut settings, &file_cfg);
        }
    }

    apply_env(&mut settings);
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.bind_addr = v.clone();
    }
    if let Some(v) = file_cfg.get("api_token") {
        settings.api_token = v.clone();
    }
    if let Some(v) = file_cfg.get("gpio_backend") {
        settings.gpio_backend = v.clone();
    }
    if let Some(v) = file_cfg.get("led_gpio_pin") {
        if let Ok(parsed) = v.parse::<u8>() {
            settings.led_gpio_pin = parsed;
        }
    }
    if let Some(v) = file_cfg.get("pwm_frequency_hz") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.pwm_frequency_hz = parsed;
        }
    }
    if let Some(v) = file_cfg.get("device_id") {
        settings.device_id = v.clone();
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings) {
    if let Ok(v) = std::env::var("NIGHTLIGHT_BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_API_TOKEN") {
        settings.api_token = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_GPIO_BACKEND") {
        settings.gpio_backend = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_LED_GPIO_PIN") {
        if let Ok(parsed) = v.parse::<u8>() {
            settings.led_gpio_pin = parsed;
        }
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_PWM_FREQUENCY_HZ") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.pwm_frequency_hz = parsed;
        }
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_DEVICE_ID") {
        settings.device_id = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_LOG_FILTER") {
        settings.log_filter = v;
    }
}

/// Startup validation; failures abort before the service accepts traffic.
pub fn validate_settings(settings: &Settings) -> anyhow::Result<()> {
    if settings.api_token.len() < MIN_API_TOKEN_LEN {
        bail!("NIGHTLIGHT_API_TOKEN must be set and at least {MIN_API_TOKEN_LEN} characters long");
    }
    if settings.pwm_frequency_hz == 0 {
        bail!("pwm_frequency_hz must be at least 1");
    }
    if settings.device_id.trim().is_empty() {
        bail!("device_id must not be empty");
    }
    Ok(())
}
