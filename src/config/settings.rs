use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ddsweb_core::dds::DdsOptions;
use ddsweb_core::session::SessionScope;
use ddsweb_core::signal::{LevelUnit, SignalConfig};

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Browser front end for a DDS signal generator")]
pub struct Config {
    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Page served for every HTTP request
    #[arg(long)]
    pub page: Option<PathBuf>,

    /// Path to the dds executable
    #[arg(long)]
    pub dds: Option<String>,

    /// Whether connected clients share one set of signal values
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,
}

/// CLI spelling of [`SessionScope`]
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeArg {
    Shared,
    Connection,
}

impl From<ScopeArg> for SessionScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Shared => SessionScope::Shared,
            ScopeArg::Connection => SessionScope::Connection,
        }
    }
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Web server settings
    #[serde(default)]
    pub web: WebSettings,

    /// dds invocation settings
    #[serde(default)]
    pub dds: DdsSettings,

    /// Session scope and initial signal values
    #[serde(default)]
    pub session: SessionSettings,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSettings {
    /// Web server port
    #[serde(default = "default_web_port")]
    pub port: u16,

    /// File served for every request, whatever the path
    #[serde(default = "default_page")]
    pub page: PathBuf,
}

fn default_web_port() -> u16 {
    8081
}

fn default_page() -> PathBuf {
    PathBuf::from("index.html")
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            page: default_page(),
        }
    }
}

/// dds invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdsSettings {
    /// Path to the dds executable
    #[serde(default = "default_program")]
    pub program: String,

    /// Pass `--brief` to dds
    #[serde(default)]
    pub brief: bool,

    /// Power flag: "rel" (`--rel-level`) or "dbm" (`--dbm-level`)
    #[serde(default)]
    pub level: LevelUnit,

    /// Seconds to wait for dds before reporting an error
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "./dds".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for DdsSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            brief: false,
            level: LevelUnit::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DdsSettings {
    pub fn options(&self) -> DdsOptions {
        DdsOptions {
            program: self.program.clone(),
            brief: self.brief,
            level: self.level,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// "connection" (default) or "shared"
    #[serde(default)]
    pub scope: SessionScope,

    /// Values a new session starts with
    #[serde(flatten)]
    pub defaults: SignalConfig,
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::load_file(p);
            }
            tracing::warn!("Config file {:?} not found, falling back to defaults", p);
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("ddsweb/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/ddsweb/config.toml")),
            dirs::home_dir().map(|p| p.join(".ddsweb.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(port) = cli.port {
            self.web.port = port;
        }
        if let Some(ref page) = cli.page {
            self.web.page = page.clone();
        }
        if let Some(ref dds) = cli.dds {
            self.dds.program = dds.clone();
        }
        if let Some(scope) = cli.scope {
            self.session.scope = scope.into();
        }
    }

    /// Validate and normalize settings values
    pub fn validate(&mut self) {
        const MIN_TIMEOUT_SECS: u64 = 1;

        if self.dds.timeout_secs < MIN_TIMEOUT_SECS {
            self.dds.timeout_secs = MIN_TIMEOUT_SECS;
        }
    }
}
