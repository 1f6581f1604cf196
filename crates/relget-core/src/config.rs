use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of GET attempts per asset (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 43,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Curl transfer settings (`[http]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort an attempt when throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit per attempt.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Value of `X-GitHub-Api-Version` sent with release and asset requests.
    pub github_api_version: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            timeout_secs: 3600,
            user_agent: concat!("relget/", env!("CARGO_PKG_VERSION")).to_string(),
            github_api_version: "2022-11-28".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/relget/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelgetConfig {
    /// Show terminal and taskbar progress while downloading.
    #[serde(default = "default_progress")]
    pub progress: bool,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_progress() -> bool {
    true
}

impl Default for RelgetConfig {
    fn default() -> Self {
        Self {
            progress: true,
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("relget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RelgetConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RelgetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: RelgetConfig = toml::from_str(&data)?;
    Ok(cfg)
}
