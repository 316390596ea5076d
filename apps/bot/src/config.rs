use std::collections::HashSet;

use anyhow::{bail, Context};

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub telegram_bot_token: String,
    pub api_base_url: String,
    pub api_token: String,
    pub device_id: String,
    /// Comma-separated chat ids; empty means no restriction.
    pub allowed_chat_ids: String,
    pub tls_verify: bool,
    pub log_filter: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            api_base_url: "https://localhost:8443".into(),
            api_token: String::new(),
            device_id: "nightlight".into(),
            allowed_chat_ids: String::new(),
            tls_verify: true,
            log_filter: "info".into(),
        }
    }
}

impl BotSettings {
    /// Parses the allowlist. An empty value disables the restriction.
    pub fn allowed_chat_ids(&self) -> anyhow::Result<HashSet<i64>> {
        let mut ids = HashSet::new();
        for part in self.allowed_chat_ids.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let id = part
                .parse::<i64>()
                .with_context(|| format!("invalid chat id '{part}' in allowlist"))?;
            ids.insert(id);
        }
        Ok(ids)
    }
}

pub fn load_bot_settings() -> BotSettings {
    let mut settings = BotSettings::default();

    if let Ok(v) = std::env::var("NIGHTLIGHT_TELEGRAM_BOT_TOKEN") {
        settings.telegram_bot_token = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_TELEGRAM_API_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_API_TOKEN") {
        settings.api_token = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_DEVICE_ID") {
        settings.device_id = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_TELEGRAM_ALLOWED_CHAT_IDS") {
        settings.allowed_chat_ids = v;
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_TELEGRAM_TLS_VERIFY") {
        settings.tls_verify = !matches!(v.trim(), "0" | "false" | "no");
    }
    if let Ok(v) = std::env::var("NIGHTLIGHT_LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}

pub fn validate_bot_settings(settings: &BotSettings) -> anyhow::Result<()> {
    if settings.telegram_bot_token.is_empty() {
        bail!("NIGHTLIGHT_TELEGRAM_BOT_TOKEN is required to run the bot");
    }
    if settings.api_token.is_empty() {
        bail!("NIGHTLIGHT_API_TOKEN is required to reach the API");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allowlist_means_no_restriction() {
        let settings = BotSettings::default();
        assert!(settings.allowed_chat_ids().expect("parse").is_empty());
    }

    #[test]
    fn allowlist_parses_and_skips_blanks() {
        let settings = BotSettings {
            allowed_chat_ids: " 12345, , -67890 ".into(),
            ..BotSettings::default()
        };
        let ids = settings.allowed_chat_ids().expect("parse");
        assert_eq!(ids, HashSet::from([12345, -67890]));
    }

    #[test]
    fn allowlist_rejects_garbage() {
        let settings = BotSettings {
            allowed_chat_ids: "12345,abc".into(),
            ..BotSettings::default()
        };
        assert!(settings.allowed_chat_ids().is_err());
    }

    #[test]
    fn validation_requires_both_tokens() {
        let mut settings = BotSettings::default();
        assert!(validate_bot_settings(&settings).is_err());
        settings.telegram_bot_token = "12345:abc".into();
        assert!(validate_bot_settings(&settings).is_err());
        settings.api_token = "0123456789abcdef".into();
        validate_bot_settings(&settings).expect("valid");
    }
}
