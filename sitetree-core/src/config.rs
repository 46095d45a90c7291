//! Process configuration and the crawl allow-list.
//!
//! `AppConfig` is read once at startup (environment, with `.env` honoured)
//! and handed to whatever needs it; nothing here is global.

use crate::error::{Result, TreeError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

pub const DEFAULT_ALLOWED_SITES_FILE: &str = "allowed-sites.txt";
pub const DEFAULT_PORT: u16 = 8090;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_STATIC_DIR: &str = "./dist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub allowed_sites_file: PathBuf,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    /// Return error details to HTTP clients instead of a generic message.
    pub verbose_errors: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_sites_file: PathBuf::from(DEFAULT_ALLOWED_SITES_FILE),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            verbose_errors: false,
        }
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(file) = lookup("ALLOWED_SITES_FILE") {
            config.allowed_sites_file = PathBuf::from(file);
        }
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| TreeError::Config(format!("PORT '{}': {}", port, e)))?;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(verbose) = lookup("VERBOSE_ERRORS") {
            config.verbose_errors = parse_flag(&verbose)
                .ok_or_else(|| TreeError::Config(format!("VERBOSE_ERRORS '{}' is not a boolean", verbose)))?;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Hostnames that may be crawled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    hosts: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Read one hostname per line; blank lines are ignored and `~` is expanded.
    pub fn load(path: &Path) -> Result<Self> {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        info!("loading allowed sites from file '{}'", expanded);

        let content = fs::read_to_string(&expanded).map_err(|e| {
            TreeError::Config(format!("unable to read allowed sites file {}: {}", expanded, e))
        })?;
        let allow_list = Self::new(content.lines());

        info!("{} allowed sites loaded", allow_list.len());
        Ok(allow_list)
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_lowercase())
    }

    /// Fail unless `url`'s host is on the list.
    pub fn check(&self, url: &Url) -> Result<()> {
        let host = url.host_str().unwrap_or_default();
        if self.contains(host) {
            Ok(())
        } else {
            Err(TreeError::HostNotAllowed(host.to_string()))
        }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
