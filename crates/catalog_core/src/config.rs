use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

use crate::{controller::ListSettings, service::ServiceSettings};

pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub page_size: i64,
    pub refresh_interval_ms: u64,
    pub load_delay_ms: u64,
    pub insert_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            page_size: 5,
            refresh_interval_ms: 2000,
            load_delay_ms: 1500,
            insert_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    page_size: Option<i64>,
    refresh_interval_ms: Option<u64>,
    load_delay_ms: Option<u64>,
    insert_delay_ms: Option<u64>,
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.api_url)
            .with_context(|| format!("invalid api url '{}'", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api url '{}' must use http or https", self.api_url);
        }
        if self.page_size <= 0 {
            bail!("page size must be positive, got {}", self.page_size);
        }
        if self.refresh_interval_ms == 0 {
            bail!("refresh interval must be positive");
        }
        Ok(())
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            load_delay: Duration::from_millis(self.load_delay_ms),
            insert_delay: Duration::from_millis(self.insert_delay_ms),
        }
    }

    pub fn list_settings(&self) -> ListSettings {
        ListSettings {
            page_size: self.page_size,
            refresh_interval: Duration::from_millis(self.refresh_interval_ms),
        }
    }
}

/// Defaults, then the TOML file if present, then environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
        .with_context(|| format!("failed to load settings from '{}'", path.display()))
}

pub fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings = toml::from_str(raw).context("malformed settings file")?;
        if let Some(v) = file_cfg.api_url {
            settings.api_url = v;
        }
        if let Some(v) = file_cfg.page_size {
            settings.page_size = v;
        }
        if let Some(v) = file_cfg.refresh_interval_ms {
            settings.refresh_interval_ms = v;
        }
        if let Some(v) = file_cfg.load_delay_ms {
            settings.load_delay_ms = v;
        }
        if let Some(v) = file_cfg.insert_delay_ms {
            settings.insert_delay_ms = v;
        }
    }

    if let Some(v) = env("CATALOG_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("APP__PAGE_SIZE") {
        settings.page_size = parse_env("APP__PAGE_SIZE", &v)?;
    }
    if let Some(v) = env("APP__REFRESH_INTERVAL_MS") {
        settings.refresh_interval_ms = parse_env("APP__REFRESH_INTERVAL_MS", &v)?;
    }
    if let Some(v) = env("APP__LOAD_DELAY_MS") {
        settings.load_delay_ms = parse_env("APP__LOAD_DELAY_MS", &v)?;
    }
    if let Some(v) = env("APP__INSERT_DELAY_MS") {
        settings.insert_delay_ms = parse_env("APP__INSERT_DELAY_MS", &v)?;
    }

    Ok(settings)
}

fn parse_env<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value '{raw}' for {key}"))
}
