//! Configuration loading and root folder resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: a warning is logged and
//! the remaining tiers apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_ROOT_FOLDER: &str = "FOLIO_ROOT_FOLDER";
pub const ENV_REMOTE_URL: &str = "FOLIO_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "FOLIO_REMOTE_KEY";

const DATABASE_FILE: &str = "folio.db";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_host: String,
    pub port: u16,
    pub log_level: String,
    /// Settings key of the slot holding the assignment collection
    pub storage_key: String,
    pub remote_table: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            bind_host: "127.0.0.1".to_string(),
            port: 5780,
            log_level: "info".to_string(),
            storage_key: "robotics-assignments".to_string(),
            remote_table: "assignments".to_string(),
        }
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("folio"))
        .unwrap_or_else(|| PathBuf::from("./folio_data"))
}

/// Default config file location (`<config dir>/folio/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("folio").join("config.toml"))
}

/// `[remote]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteSection {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub table: Option<String>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub storage_key: Option<String>,
    #[serde(default)]
    pub remote: Option<RemoteSection>,
}

impl TomlConfig {
    /// Parse a config file, failing on I/O or syntax errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the config file if it exists, otherwise fall back to an empty config
    ///
    /// `path` of None means the platform default location.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using defaults");
                return Self::default();
            }
        };

        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                Self::default()
            }
        }
    }
}

/// Non-empty environment variable value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Root folder resolution following the standard priority order
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_value: toml.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Some(path) = env_value(ENV_ROOT_FOLDER) {
            return PathBuf::from(path);
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder for use
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            debug!("Created root folder {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Connection settings for the remote record table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Anonymous API key sent with every request
    pub anon_key: String,
    pub table: String,
}

impl RemoteConfig {
    /// Resolve the remote settings; None when URL or key is missing (sync disabled)
    pub fn resolve(
        cli_url: Option<&str>,
        cli_key: Option<&str>,
        toml: &TomlConfig,
    ) -> Option<Self> {
        let section = toml.remote.clone().unwrap_or_default();

        let url = cli_url
            .map(str::to_string)
            .or_else(|| env_value(ENV_REMOTE_URL))
            .or(section.url)
            .filter(|u| !u.trim().is_empty())?;

        let anon_key = cli_key
            .map(str::to_string)
            .or_else(|| env_value(ENV_REMOTE_KEY))
            .or(section.anon_key)
            .filter(|k| !k.trim().is_empty())?;

        let table = section
            .table
            .unwrap_or_else(|| CompiledDefaults::for_current_platform().remote_table);

        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            table,
        })
    }
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub root_folder: Option<PathBuf>,
    pub bind_host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub db_path: PathBuf,
    pub bind_host: String,
    pub port: u16,
    pub log_level: String,
    pub storage_key: String,
    pub remote: Option<RemoteConfig>,
}

impl ServiceConfig {
    pub fn resolve(cli: CliOverrides) -> Self {
        let toml = TomlConfig::load_or_default(cli.config_path.as_deref());
        Self::resolve_with(cli, &toml)
    }

    /// Resolve against an already loaded config file
    pub fn resolve_with(cli: CliOverrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let root_folder = RootFolderResolver::new(cli.root_folder.clone(), toml).resolve();
        let db_path = RootFolderInitializer::new(root_folder.clone()).database_path();
        let remote = RemoteConfig::resolve(
            cli.remote_url.as_deref(),
            cli.remote_key.as_deref(),
            toml,
        );

        Self {
            root_folder,
            db_path,
            bind_host: cli
                .bind_host
                .or_else(|| toml.bind_host.clone())
                .unwrap_or(defaults.bind_host),
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            log_level: cli
                .log_level
                .or_else(|| toml.log_level.clone())
                .unwrap_or(defaults.log_level),
            storage_key: toml.storage_key.clone().unwrap_or(defaults.storage_key),
            remote,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}
