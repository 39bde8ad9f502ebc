use std::{collections::HashMap, fs, time::Duration};

use anyhow::{Context, Result};
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub service_url: String,
    pub catalog_page_size: u32,
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8000/api/v1".into(),
            catalog_page_size: 100,
            debounce_ms: 500,
        }
    }
}

impl Settings {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("orderhub.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("service_url") {
                settings.service_url = v.clone();
            }
            if let Some(v) = file_cfg.get("catalog_page_size") {
                if let Ok(v) = v.parse() {
                    settings.catalog_page_size = v;
                }
            }
            if let Some(v) = file_cfg.get("debounce_ms") {
                if let Ok(v) = v.parse() {
                    settings.debounce_ms = v;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("ORDERHUB_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Ok(v) = std::env::var("ORDERHUB_CATALOG_PAGE_SIZE") {
        if let Ok(v) = v.parse() {
            settings.catalog_page_size = v;
        }
    }
    if let Ok(v) = std::env::var("ORDERHUB_DEBOUNCE_MS") {
        if let Ok(v) = v.parse() {
            settings.debounce_ms = v;
        }
    }

    settings
}

pub fn validate_service_url(raw: &str) -> Result<()> {
    Url::parse(raw).with_context(|| format!("invalid service url: {raw}"))?;
    Ok(())
}
