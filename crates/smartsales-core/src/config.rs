//! Configuration for SmartSales365 tooling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmartSalesConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub list: ListConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SmartSalesConfig {
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `SMARTSALES_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SMARTSALES_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(token) = std::env::var("SMARTSALES_API_TOKEN") {
            self.api.token = Some(token);
        }
        if let Ok(timeout) = std::env::var("SMARTSALES_API_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.api.timeout_secs = secs;
            }
        }
        if let Ok(size) = std::env::var("SMARTSALES_PAGE_SIZE") {
            if let Ok(size) = size.parse() {
                self.list.page_size = size;
            }
        }
        if let Ok(dir) = std::env::var("SMARTSALES_EXPORT_DIR") {
            self.export.output_dir = PathBuf::from(dir);
        }
        if let Ok(level) = std::env::var("SMARTSALES_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::Error::Config(
                "API base URL not configured. Set SMARTSALES_API_URL or use 'smartsales configure'"
                    .to_string(),
            ));
        }
        url::Url::parse(&self.api.base_url).map_err(|e| {
            crate::Error::Config(format!("Invalid API base URL '{}': {}", self.api.base_url, e))
        })?;
        if self.list.page_size == 0 {
            return Err(crate::Error::Config("list.page_size must be positive".to_string()));
        }
        if !crate::EXPORT_CAPS.contains(&self.export.default_cap) {
            return Err(crate::Error::Config(format!(
                "export.default_cap must be one of {:?}",
                crate::EXPORT_CAPS
            )));
        }
        Ok(())
    }
}

/// Backend API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Bearer token forwarded as `Authorization`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    pub page_size: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: crate::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Export artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory artifacts are written to
    pub output_dir: PathBuf,
    /// Row cap used when the caller does not choose one
    pub default_cap: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            default_cap: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
