use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const DAILY_VIEW_URL: &str = "https://ihdschool.com/the-daily-view";
pub const TRANSLATE_URL: &str = "https://api.deepseek.com/chat/completions";
pub const ART_API_BASE: &str = "https://cloud.leonardo.ai/api/rest/v1";
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Runtime settings: hard defaults overlaid with `IHDS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub page_url: String,
    pub translate_url: String,
    pub translate_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub fetch_timeout_secs: u64,
    pub translate_timeout_secs: u64,
    pub asset_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub collection_dir: Option<PathBuf>,
    pub user_agent: String,
    pub art_api_base: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(Environment::with_prefix("IHDS").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("page_url", DAILY_VIEW_URL)?
            .set_default("translate_url", TRANSLATE_URL)?
            .set_default("translate_model", "deepseek-chat")?
            .set_default("temperature", 0.3)?
            .set_default("max_tokens", 2000)?
            .set_default("fetch_timeout_secs", 30)?
            .set_default("translate_timeout_secs", 60)?
            .set_default("asset_timeout_secs", 30)?
            .set_default("output_dir", "output/daily_views")?
            .set_default("user_agent", USER_AGENT)?
            .set_default("art_api_base", ART_API_BASE)
    }

    #[cfg(test)]
    pub fn defaults() -> Self {
        Self::builder()
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .unwrap()
    }

    /// Shared image collection; lives beside the dated run directories by default.
    pub fn collection_dir(&self) -> PathBuf {
        self.collection_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("images"))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn translate_timeout(&self) -> Duration {
        Duration::from_secs(self.translate_timeout_secs)
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_timeout_secs)
    }
}

// ── Tests ──
