use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_DEMOGRAPHIC_OFFSET, DEFAULT_RELATED_LIMIT, DEFAULT_WINDOW_SIZE};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Aggregation knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_demographic_offset")]
    pub demographic_offset: f64,

    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
}

/// Naver Open API / search-ad API access
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_datalab_url")]
    pub datalab_url: String,

    #[serde(default = "default_search_url")]
    pub search_url: String,

    #[serde(default = "default_keyword_tool_url")]
    pub keyword_tool_url: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub ad_api_key: String,

    #[serde(default)]
    pub ad_secret_key: String,

    #[serde(default)]
    pub ad_customer_id: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_demographic_lookback_days")]
    pub demographic_lookback_days: u32,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_demographic_offset() -> f64 {
    DEFAULT_DEMOGRAPHIC_OFFSET
}
fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}
fn default_related_limit() -> usize {
    DEFAULT_RELATED_LIMIT
}
fn default_datalab_url() -> String {
    "https://openapi.naver.com/v1/datalab/search".to_string()
}
fn default_search_url() -> String {
    "https://openapi.naver.com/v1/search".to_string()
}
fn default_keyword_tool_url() -> String {
    "https://api.naver.com/keywordstool".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_ms() -> u64 {
    250
}
fn default_user_agent() -> String {
    "trend-report/0.1".to_string()
}
fn default_demographic_lookback_days() -> u32 {
    30
}
fn default_fetch_timeout_secs() -> u64 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            demographic_offset: default_demographic_offset(),
            window_size: default_window_size(),
            related_limit: default_related_limit(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            datalab_url: default_datalab_url(),
            search_url: default_search_url(),
            keyword_tool_url: default_keyword_tool_url(),
            client_id: String::new(),
            client_secret: String::new(),
            ad_api_key: String::new(),
            ad_secret_key: String::new(),
            ad_customer_id: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            user_agent: default_user_agent(),
            demographic_lookback_days: default_demographic_lookback_days(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("TREND")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        Self::from_config(cfg)
    }

    fn from_config(cfg: config::Config) -> Result<Self> {
        let app_cfg: AppConfig = cfg
            .try_deserialize()
            .context("Invalid configuration")?;
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.engine.window_size > 0, "engine.window_size must be at least 1");
        anyhow::ensure!(
            self.engine.demographic_offset.is_finite(),
            "engine.demographic_offset must be a finite number"
        );
        anyhow::ensure!(
            self.pipeline.fetch_timeout_secs > 0,
            "pipeline.fetch_timeout_secs must be at least 1"
        );
        Ok(())
    }

    /// Copy safe to print: credentials replaced by a marker.
    pub fn redacted(&self) -> Self {
        fn mask(s: &str) -> String {
            if s.is_empty() { String::new() } else { "****".to_string() }
        }

        let mut out = self.clone();
        out.source.client_id = mask(&out.source.client_id);
        out.source.client_secret = mask(&out.source.client_secret);
        out.source.ad_api_key = mask(&out.source.ad_api_key);
        out.source.ad_secret_key = mask(&out.source.ad_secret_key);
        out.source.ad_customer_id = mask(&out.source.ad_customer_id);
        out
    }
}
