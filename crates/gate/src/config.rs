//! Gate configuration: CLI flags / env vars layered over an optional YAML file.
//!
//! Precedence (highest first): flag or `AOC_GATE_*` env var, YAML file, built-in default.
//! Everything is resolved once at startup and never re-read.

use crate::canonical::CanonicalHost;
use crate::credentials::SharedSecret;
use crate::error::{GateError, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_CANONICAL_HOST: &str = "agentsofchaos.baulab.info";
pub const DEFAULT_PREVIEW_SUFFIX: &str = ".pages.dev";
pub const DEFAULT_REALM: &str = "Agents of Chaos";
pub const DEFAULT_BIND: &str = "127.0.0.1:8788";
pub const DEFAULT_SITE_DIR: &str = "website";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "aoc-gate",
    version,
    about = "Serve the research site behind a canonical-host redirect and HTTP Basic Auth"
)]
pub struct Cli {
    /// Optional YAML config file (camelCase keys).
    #[arg(short, long, env = "AOC_GATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "AOC_GATE_BIND")]
    pub bind: Option<SocketAddr>,

    /// Directory containing the built website.
    #[arg(long, env = "AOC_GATE_SITE_DIR")]
    pub site_dir: Option<PathBuf>,

    /// Authoritative hostname preview deployments redirect to.
    #[arg(long, env = "AOC_GATE_CANONICAL_HOST")]
    pub canonical_host: Option<String>,

    /// Hostname suffix identifying preview deployments.
    #[arg(long, env = "AOC_GATE_PREVIEW_SUFFIX")]
    pub preview_suffix: Option<String>,

    /// Realm shown in the browser's credential prompt.
    #[arg(long, env = "AOC_GATE_REALM")]
    pub realm: Option<String>,

    /// Shared site password. Prefer the env var; the flag is hidden.
    #[arg(long, env = "AOC_GATE_PASSWORD", hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Log filter (overridden by `RUST_LOG`).
    #[arg(long, env = "AOC_GATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "AOC_GATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// YAML config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub bind: Option<SocketAddr>,
    #[serde(default)]
    pub site_dir: Option<PathBuf>,
    #[serde(default)]
    pub canonical_host: Option<String>,
    #[serde(default)]
    pub preview_suffix: Option<String>,
    #[serde(default)]
    pub realm: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Everything the access gate needs. Immutable once built.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub password: SharedSecret,
    pub canonical_host: String,
    pub preview_suffix: String,
    pub realm: String,
}

impl GateConfig {
    /// Config with the production host/suffix/realm and the given password.
    #[must_use]
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: SharedSecret::new(password),
            canonical_host: DEFAULT_CANONICAL_HOST.to_string(),
            preview_suffix: DEFAULT_PREVIEW_SUFFIX.to_string(),
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Reject configurations the gate cannot serve correctly.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Config` if the password is empty, the canonical host is not a bare
    /// hostname, the preview suffix is empty or matches the canonical host (redirect loop), or
    /// the realm cannot be quoted in `WWW-Authenticate`.
    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(GateError::Config(
                "password is required (set AOC_GATE_PASSWORD)".to_string(),
            ));
        }

        validate_hostname(&self.canonical_host)?;

        if self.preview_suffix.trim().is_empty() {
            return Err(GateError::Config(
                "previewSuffix must be non-empty".to_string(),
            ));
        }

        let rule = CanonicalHost::new(&self.canonical_host, &self.preview_suffix);
        if rule.is_preview_host(&self.canonical_host) {
            return Err(GateError::Config(format!(
                "canonical host '{}' matches preview suffix '{}'; every request would redirect to itself",
                self.canonical_host, self.preview_suffix
            )));
        }

        if self
            .realm
            .chars()
            .any(|c| c == '"' || c == '\\' || c.is_control())
        {
            return Err(GateError::Config(
                "realm must not contain quotes, backslashes or control characters".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_hostname(host: &str) -> Result<()> {
    let invalid = || GateError::Config(format!("canonicalHost '{host}' is not a bare hostname"));
    if host.trim().is_empty() {
        return Err(GateError::Config("canonicalHost must be non-empty".to_string()));
    }
    let url = Url::parse(&format!("https://{host}/")).map_err(|_| invalid())?;
    let same_host = url
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case(host));
    if !same_host || url.port().is_some() || url.path() != "/" || !url.username().is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub site_dir: PathBuf,
    pub gate: GateConfig,
}

/// Read and parse a YAML config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML for [`FileConfig`].
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GateError::Config(format!("read config {}: {e}", path.display()))
    })?;
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(&raw)?)
}

impl Cli {
    /// Merge flags/env over the YAML file (if any) and defaults, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable, a value is invalid, or the site
    /// directory does not exist.
    pub fn resolve(&self) -> Result<ServeConfig> {
        let file = match &self.config {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };
        self.resolve_with(file)
    }

    fn resolve_with(&self, file: FileConfig) -> Result<ServeConfig> {
        let bind = match self.bind.or(file.bind) {
            Some(addr) => addr,
            None => DEFAULT_BIND
                .parse()
                .map_err(|e| GateError::Config(format!("default bind address: {e}")))?,
        };
        let site_dir = self
            .site_dir
            .clone()
            .or(file.site_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SITE_DIR));

        let gate = GateConfig {
            password: SharedSecret::new(
                self.password.clone().or(file.password).unwrap_or_default(),
            ),
            canonical_host: self
                .canonical_host
                .clone()
                .or(file.canonical_host)
                .unwrap_or_else(|| DEFAULT_CANONICAL_HOST.to_string()),
            preview_suffix: self
                .preview_suffix
                .clone()
                .or(file.preview_suffix)
                .unwrap_or_else(|| DEFAULT_PREVIEW_SUFFIX.to_string()),
            realm: self
                .realm
                .clone()
                .or(file.realm)
                .unwrap_or_else(|| DEFAULT_REALM.to_string()),
        };
        gate.validate()?;

        if !site_dir.is_dir() {
            return Err(GateError::Config(format!(
                "site directory {} does not exist or is not a directory",
                site_dir.display()
            )));
        }

        Ok(ServeConfig {
            bind,
            site_dir,
            gate,
        })
    }
}
