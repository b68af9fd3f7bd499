/// CLI configuration
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Base URL of the Cloudbox API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Where the session token is persisted between runs
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Seconds between background refreshes in `watch`
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl CliConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        Self::load_from(PathBuf::from("cloudbox.toml"))
    }

    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        let mut settings = config::Config::builder();

        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        }

        // Override with environment variables (CLOUDBOX_API_URL, ...)
        settings =
            settings.add_source(config::Environment::with_prefix("CLOUDBOX").try_parsing(true));

        let config = settings.build().context("Failed to load configuration")?;

        config.try_deserialize().context("Invalid configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            bail!("API URL is required (set CLOUDBOX_API_URL)");
        }

        if self.refresh_secs == 0 {
            bail!("Refresh interval must be at least one second");
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

// Default values
fn default_api_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".cloudbox/session.json")
}

fn default_refresh_secs() -> u64 {
    cloudbox_state::DEFAULT_REFRESH_INTERVAL.as_secs()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            session_file: default_session_file(),
            refresh_secs: default_refresh_secs(),
        }
    }
}
