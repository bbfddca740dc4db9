//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests that manipulate FOLIO_* environment variables are marked #[serial]
//! so they never run in parallel with each other.

use folio_common::config::{
    CliOverrides, CompiledDefaults, RemoteConfig, RootFolderInitializer, RootFolderResolver,
    ServiceConfig, TomlConfig, ENV_REMOTE_KEY, ENV_REMOTE_URL, ENV_ROOT_FOLDER,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ENV_ROOT_FOLDER);
    env::remove_var(ENV_REMOTE_URL);
    env::remove_var(ENV_REMOTE_KEY);
}

fn toml_with_remote(url: &str, key: &str) -> TomlConfig {
    toml::from_str(&format!(
        "[remote]\nurl = \"{}\"\nanon_key = \"{}\"\ntable = \"portfolio_rows\"\n",
        url, key
    ))
    .unwrap()
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
    assert_eq!(defaults.storage_key, "robotics-assignments");
    assert_eq!(defaults.remote_table, "assignments");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    clear_env();

    let resolver = RootFolderResolver::new(None, &TomlConfig::default());
    let root_folder = resolver.resolve();

    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var() {
    clear_env();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/folio-test-env-folder");

    let resolver = RootFolderResolver::new(None, &TomlConfig::default());

    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/folio-test-env-folder"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_cli_beats_env_and_toml() {
    clear_env();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/folio-from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/folio-from-toml")),
        ..Default::default()
    };

    let resolver = RootFolderResolver::new(Some(PathBuf::from("/tmp/folio-from-cli")), &toml);

    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/folio-from-cli"));

    clear_env();
}

#[test]
#[serial]
fn test_resolver_toml_used_when_no_cli_or_env() {
    clear_env();
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/folio-from-toml")),
        ..Default::default()
    };

    let resolver = RootFolderResolver::new(None, &toml);

    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/folio-from-toml"));
}

#[test]
fn test_initializer_creates_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("folio.db"));
}

#[test]
fn test_missing_config_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TomlConfig::load_or_default(Some(&dir.path().join("absent.toml")));

    assert!(config.port.is_none());
    assert!(config.remote.is_none());
}

#[test]
fn test_malformed_config_file_degrades_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"\n[[[").unwrap();

    assert!(TomlConfig::load(&path).is_err());

    let config = TomlConfig::load_or_default(Some(&path));
    assert!(config.port.is_none());
}

#[test]
fn test_config_file_is_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 6100\nlog_level = \"debug\"\n").unwrap();

    let config = TomlConfig::load_or_default(Some(&path));

    assert_eq!(config.port, Some(6100));
    assert_eq!(config.log_level.as_deref(), Some("debug"));
}

#[test]
#[serial]
fn test_remote_disabled_without_url_or_key() {
    clear_env();

    assert!(RemoteConfig::resolve(None, None, &TomlConfig::default()).is_none());
    assert!(RemoteConfig::resolve(Some("https://x.supabase.co"), None, &TomlConfig::default()).is_none());
    assert!(RemoteConfig::resolve(Some(""), Some("key"), &TomlConfig::default()).is_none());
}

#[test]
#[serial]
fn test_remote_from_toml() {
    clear_env();
    let toml = toml_with_remote("https://toml.supabase.co/", "toml-key");

    let remote = RemoteConfig::resolve(None, None, &toml).unwrap();

    assert_eq!(remote.url, "https://toml.supabase.co");
    assert_eq!(remote.anon_key, "toml-key");
    assert_eq!(remote.table, "portfolio_rows");
}

#[test]
#[serial]
fn test_remote_env_beats_toml_and_cli_beats_env() {
    clear_env();
    let toml = toml_with_remote("https://toml.supabase.co", "toml-key");
    env::set_var(ENV_REMOTE_URL, "https://env.supabase.co");
    env::set_var(ENV_REMOTE_KEY, "env-key");

    let from_env = RemoteConfig::resolve(None, None, &toml).unwrap();
    assert_eq!(from_env.url, "https://env.supabase.co");
    assert_eq!(from_env.anon_key, "env-key");

    let from_cli = RemoteConfig::resolve(Some("https://cli.supabase.co"), None, &toml).unwrap();
    assert_eq!(from_cli.url, "https://cli.supabase.co");
    assert_eq!(from_cli.anon_key, "env-key");

    clear_env();
}

#[test]
#[serial]
fn test_service_config_priority() {
    clear_env();
    let toml = TomlConfig {
        port: Some(6200),
        bind_host: Some("0.0.0.0".to_string()),
        storage_key: Some("portfolio".to_string()),
        ..Default::default()
    };
    let cli = CliOverrides {
        root_folder: Some(PathBuf::from("/tmp/folio-service")),
        port: Some(6300),
        ..Default::default()
    };

    let config = ServiceConfig::resolve_with(cli, &toml);

    assert_eq!(config.port, 6300);
    assert_eq!(config.bind_host, "0.0.0.0");
    assert_eq!(config.bind_addr(), "0.0.0.0:6300");
    assert_eq!(config.storage_key, "portfolio");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.db_path, PathBuf::from("/tmp/folio-service/folio.db"));
    assert!(config.remote.is_none());
}
