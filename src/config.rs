use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::data::export::CsvQuoting;
use crate::data::view::FilterPagePolicy;

/// Environment variable that overrides [`AppConfig::upload_url`].
pub const UPLOAD_URL_ENV: &str = "TOWER_VIEW_UPLOAD_URL";

pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:8000/upload";

/// User settings, read from `<config dir>/tower-view/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gateway endpoint the picked file is posted to.
    pub upload_url: String,
    /// Write exports straight into this directory instead of asking.
    pub export_dir: Option<PathBuf>,
    /// Quote CSV fields that contain commas, quotes or newlines.
    pub escape_csv: bool,
    /// Go back to page 1 whenever the date filter changes.
    pub reset_page_on_filter: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            export_dir: None,
            escape_csv: false,
            reset_page_on_filter: false,
        }
    }
}

impl AppConfig {
    /// Load from the default location, then apply the environment override.
    ///
    /// A missing or unreadable file falls back to defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring config {}: {e:#}", path.display());
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        config.apply_env(std::env::var(UPLOAD_URL_ENV).ok());
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tower-view").join("config.json"))
    }

    fn apply_env(&mut self, upload_url: Option<String>) {
        if let Some(url) = upload_url.filter(|u| !u.trim().is_empty()) {
            self.upload_url = url.trim().to_string();
        }
    }

    /// Parsed upload endpoint; only http(s) is accepted.
    pub fn upload_url(&self) -> Result<Url> {
        let url = Url::parse(&self.upload_url)
            .with_context(|| format!("invalid upload URL '{}'", self.upload_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("upload URL must be http or https, got '{}'", url.scheme());
        }
        Ok(url)
    }

    pub fn csv_quoting(&self) -> CsvQuoting {
        if self.escape_csv {
            CsvQuoting::Standard
        } else {
            CsvQuoting::Verbatim
        }
    }

    pub fn filter_page_policy(&self) -> FilterPagePolicy {
        if self.reset_page_on_filter {
            FilterPagePolicy::ResetToFirst
        } else {
            FilterPagePolicy::KeepPage
        }
    }
}
