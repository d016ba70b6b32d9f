use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var naming an optional TOML config file
pub const CONFIG_ENV: &str = "UPI_SUMMARY_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
    /// Upper bound on one statement parse
    pub parse_timeout_secs: u64,
    /// Statements with more rows are rejected before parsing
    pub max_rows: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            parse_timeout_secs: 30,
            max_rows: 200_000,
        }
    }
}

impl ServerSection {
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_secs(self.parse_timeout_secs)
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse config TOML")
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("in {}", path.display()))
    }

    /// File (explicit path, else `$UPI_SUMMARY_CONFIG`, else defaults),
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut cfg = match path {
            Some(p) => Self::load_file(&p)?,
            None => Config::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Apply `UPI_SUMMARY_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("UPI_SUMMARY_BIND") {
            self.server.bind_addr = addr;
        }
        if let Some(secs) = lookup("UPI_SUMMARY_PARSE_TIMEOUT_SECS") {
            self.server.parse_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("UPI_SUMMARY_PARSE_TIMEOUT_SECS={secs}"))?;
        }
        if let Some(rows) = lookup("UPI_SUMMARY_MAX_ROWS") {
            self.server.max_rows = rows
                .trim()
                .parse()
                .with_context(|| format!("UPI_SUMMARY_MAX_ROWS={rows}"))?;
        }
        Ok(())
    }
}
