//! CLI configuration, loaded from a TOML file with flag overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL.
    pub base_url: String,
    /// Bearer token for the authenticated endpoints.
    pub token: Option<String>,
    /// Deep-link base used when rendering proof QR codes.
    pub deep_link_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.zkgate.dev".to_string(),
            token: None,
            deep_link_base: "https://zkgate.dev/checkin".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .context("no token configured; set `token` in the config file")
    }
}
