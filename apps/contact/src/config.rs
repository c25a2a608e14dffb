use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use client_core::{ControllerConfig, EndpointPolicy, DEFAULT_SOURCE_TAG, SUCCESS_RESET_DELAY};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub source_tag: String,
    pub success_reset_ms: u64,
    pub fallback_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            source_tag: DEFAULT_SOURCE_TAG.into(),
            success_reset_ms: SUCCESS_RESET_DELAY.as_millis() as u64,
            fallback_only: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    source_tag: Option<String>,
    success_reset_ms: Option<u64>,
    fallback_only: Option<bool>,
}

impl Settings {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            endpoint: self.endpoint.clone(),
            policy: EndpointPolicy::formspree(),
            source_tag: self.source_tag.clone(),
            success_reset_delay: Duration::from_millis(self.success_reset_ms),
            fallback_only: self.fallback_only,
        }
    }
}

/// Defaults, then the toml file (if present), then environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = v;
    }
    if let Some(v) = file_cfg.source_tag {
        settings.source_tag = v;
    }
    if let Some(v) = file_cfg.success_reset_ms {
        settings.success_reset_ms = v;
    }
    if let Some(v) = file_cfg.fallback_only {
        settings.fallback_only = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CONTACT_ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = var("APP__ENDPOINT") {
        settings.endpoint = v;
    }

    if let Some(v) = var("APP__SOURCE_TAG") {
        settings.source_tag = v;
    }

    if let Some(v) = var("APP__SUCCESS_RESET_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.success_reset_ms = parsed;
        }
    }

    if let Some(v) = var("APP__FALLBACK_ONLY") {
        settings.fallback_only = matches!(v.trim(), "1" | "true" | "yes");
    }
}
