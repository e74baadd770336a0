//! Profile configuration for the SmartSales CLI
//!
//! Config file location: ~/.smartsales/config.toml
//!
//! Example config:
//! ```toml
//! [default]
//! api_url = "http://localhost:8000/api"
//! page_size = 10
//!
//! [production]
//! api_url = "https://api.smartsales365.com/api"
//! token = "..."
//! export_dir = "/srv/reportes"
//! export_cap = 1000
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use smartsales_core::SmartSalesConfig;

/// One named profile; unset values keep the application defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend API base URL
    pub api_url: Option<String>,

    /// Bearer token
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// Rows per page for `list`
    pub page_size: Option<u32>,

    /// Directory export files are written to
    pub export_dir: Option<PathBuf>,

    /// Default export row cap
    pub export_cap: Option<u32>,
}

/// Configuration file with multiple profiles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub profiles: BTreeMap<String, Config>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let home = directories::BaseDirs::new()
            .context("Could not determine home directory")?
            .home_dir()
            .to_path_buf();

        Ok(home.join(".smartsales"))
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load a profile from the default config file
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path()?, profile)
    }

    pub fn load_from(path: &Path, profile: Option<&str>) -> Result<Self> {
        let profile_name = profile.unwrap_or("default");
        Ok(ConfigFile::read(path)?
            .profiles
            .get(profile_name)
            .cloned()
            .unwrap_or_default())
    }

    /// Save this profile to the default config file
    pub fn save(&self, profile: Option<&str>) -> Result<()> {
        self.save_to(&Self::config_path()?, profile)
    }

    pub fn save_to(&self, path: &Path, profile: Option<&str>) -> Result<()> {
        let mut file = ConfigFile::read(path)?;
        file.profiles
            .insert(profile.unwrap_or("default").to_string(), self.clone());
        file.write(path)
    }

    /// List all profiles
    pub fn list_profiles() -> Result<Vec<String>> {
        Ok(ConfigFile::read(&Self::config_path()?)?
            .profiles
            .into_keys()
            .collect())
    }

    /// Delete a profile
    pub fn delete_profile(profile: &str) -> Result<()> {
        let path = Self::config_path()?;
        let mut file = ConfigFile::read(&path)?;
        if file.profiles.remove(profile).is_some() {
            file.write(&path)?;
        }
        Ok(())
    }

    /// Overlay the values this profile sets
    pub fn apply_to(&self, config: &mut SmartSalesConfig) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.api.token = Some(token.clone());
        }
        if let Some(timeout) = self.timeout {
            config.api.timeout_secs = timeout;
        }
        if let Some(size) = self.page_size {
            config.list.page_size = size;
        }
        if let Some(dir) = &self.export_dir {
            config.export.output_dir = dir.clone();
        }
        if let Some(cap) = self.export_cap {
            config.export.default_cap = cap;
        }
    }

    /// Get a config value by key name
    pub fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "api_url" => self.api_url.clone(),
            "token" => self.token.as_ref().map(|_| "***".to_string()), // Hide secret
            "timeout" => self.timeout.map(|t| t.to_string()),
            "page_size" => self.page_size.map(|s| s.to_string()),
            "export_dir" => self.export_dir.as_ref().map(|d| d.display().to_string()),
            "export_cap" => self.export_cap.map(|c| c.to_string()),
            _ => None,
        }
    }

    /// Set a config value by key name
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => self.api_url = Some(value.to_string()),
            "token" => self.token = Some(value.to_string()),
            "timeout" => self.timeout = Some(value.parse()?),
            "page_size" => {
                let size: u32 = value.parse()?;
                if size == 0 {
                    anyhow::bail!("page_size must be positive");
                }
                self.page_size = Some(size);
            }
            "export_dir" => self.export_dir = Some(PathBuf::from(value)),
            "export_cap" => {
                let cap: u32 = value.parse()?;
                if !smartsales_core::EXPORT_CAPS.contains(&cap) {
                    anyhow::bail!(
                        "export_cap must be one of {:?}",
                        smartsales_core::EXPORT_CAPS
                    );
                }
                self.export_cap = Some(cap);
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get all config keys
    pub fn keys() -> &'static [&'static str] {
        &[
            "api_url",
            "token",
            "timeout",
            "page_size",
            "export_dir",
            "export_cap",
        ]
    }
}
