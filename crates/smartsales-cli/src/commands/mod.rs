//! CLI command implementations

pub mod configure;
pub mod export;
pub mod list;
pub mod predictions;
pub mod reports;

use std::sync::Arc;

use anyhow::{Context, Result};
use smartsales_client::{HttpTransport, TransportConfig};
use smartsales_core::SmartSalesConfig;
use tracing::debug;

use crate::OutputFormat;

/// Context passed to all commands
pub struct CommandContext {
    pub config: SmartSalesConfig,
    /// Profile selected with `--profile`, if any
    pub profile: Option<String>,
    pub output_format: OutputFormat,
    pub verbose: bool,
    pub quiet: bool,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print info message if not quiet
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print verbose message if verbose mode
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            eprintln!("[DEBUG] {}", msg);
        }
    }

    /// Backend transport built from the resolved configuration
    pub fn transport(&self) -> Result<Arc<HttpTransport>> {
        let transport = HttpTransport::new(TransportConfig::from(&self.config.api))
            .context("Failed to create backend client")?;
        debug!(base_url = %self.config.api.base_url, "Backend transport ready");
        Ok(Arc::new(transport))
    }
}
