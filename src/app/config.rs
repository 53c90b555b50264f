use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;
use url::Url;

use crate::error::{Error, Result};
use crate::ingest::upload::DEFAULT_CHUNK_SIZE;
use crate::platform::AppPaths;

const ENV_PREFIX: &str = "TOURASSIST";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub ingest: IngestConfig,
    pub ui: UIConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    /// No timeout unless set.
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub chunk_size_bytes: usize,
    /// How long a finished progress bar stays at 100% before it is cleared.
    pub progress_hold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_logging: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            progress_hold_ms: 1200,
        }
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

impl IngestConfig {
    pub fn progress_hold(&self) -> Duration {
        Duration::from_millis(self.progress_hold_ms)
    }
}

impl AppConfig {
    /// Defaults, then `config.toml` under the platform config dir, then
    /// `TOURASSIST__SECTION__KEY` environment variables. A missing file is
    /// written out with defaults.
    pub async fn load(paths: &AppPaths) -> Result<Self> {
        let config_file = paths.config_file();

        if !fs::try_exists(&config_file).await? {
            info!("Config file not found, creating default configuration");
            Self::default().save(paths).await?;
        }

        Self::load_from(&config_file)
    }

    pub fn load_from(config_file: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", config_file);

        let defaults = toml::to_string(&Self::default())?;
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(&defaults, FileFormat::Toml))
            .add_source(File::from(config_file).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, paths: &AppPaths) -> Result<()> {
        let config_file = paths.config_file();

        info!("Saving configuration to: {:?}", config_file);

        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).await?;
        }
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_file, config_content).await?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.service.base_url).map_err(|e| {
            Error::validation(format!("Invalid service base_url '{}': {}", self.service.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation("Service base_url must be http or https"));
        }

        if self.ingest.chunk_size_bytes == 0 {
            return Err(Error::validation("Ingest chunk size must be greater than 0"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(Error::validation("Logging level must not be empty"));
        }

        Ok(())
    }
}
