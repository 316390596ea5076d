//! Thin typed client for the nightlight HTTP API.
//!
//! The bot never touches GPIO directly; the API stays the single point of
//! control with the same auth and validation for every front end.

use std::time::Duration;

use shared::{
    domain::LedState,
    protocol::{SetBrightnessRequest, SetPowerRequest},
};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    device_id: String,
}

impl ApiClient {
    /// `tls_verify = false` admits the self-signed certificates common on
    /// a LAN-only device; keep it on anywhere else.
    pub fn new(
        base_url: &str,
        api_token: &str,
        device_id: &str,
        tls_verify: bool,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!tls_verify)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            device_id: device_id.to_string(),
        })
    }

    pub async fn get_state(&self) -> anyhow::Result<LedState> {
        let state = self
            .http
            .get(format!(
                "{}/api/v1/devices/{}/state",
                self.base_url, self.device_id
            ))
            .bearer_auth(&self.api_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(state)
    }

    pub async fn set_power(&self, is_on: bool) -> anyhow::Result<LedState> {
        let state = self
            .http
            .post(format!(
                "{}/api/v1/devices/{}/power",
                self.base_url, self.device_id
            ))
            .bearer_auth(&self.api_token)
            .json(&SetPowerRequest { is_on })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(state)
    }

    pub async fn set_brightness(&self, brightness: f64) -> anyhow::Result<LedState> {
        let state = self
            .http
            .post(format!(
                "{}/api/v1/devices/{}/brightness",
                self.base_url, self.device_id
            ))
            .bearer_auth(&self.api_token)
            .json(&SetBrightnessRequest { brightness })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(state)
    }
}
