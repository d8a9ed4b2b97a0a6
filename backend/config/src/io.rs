//! Config file loading.

use crate::schema::RotalogConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the rotalog config directory.
/// Priority: `ROTALOG_CONFIG_DIR` env > `~/.rotalog/` > `./.rotalog`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ROTALOG_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".rotalog"),
        None => PathBuf::from(".rotalog"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist. The format
/// follows the extension: `.json`, `.toml`, anything else is YAML.
pub fn load_config(path: &Path) -> Result<RotalogConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(RotalogConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw, path)?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

fn parse_config(raw: &str, path: &Path) -> Result<RotalogConfig> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => serde_json::from_str(raw)
            .with_context(|| format!("Failed to parse config JSON at: {}", path.display())),
        Some("toml") => toml::from_str(raw)
            .with_context(|| format!("Failed to parse config TOML at: {}", path.display())),
        _ => serde_yaml::from_str(raw)
            .with_context(|| format!("Failed to parse config YAML at: {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_default() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(&dir.path().join("config.yaml")).unwrap();
        assert!(cfg.logger.is_none());
    }

    #[test]
    fn loads_yaml() {
        let dir = TempDir::new().unwrap();
        let path = config_file_path(dir.path());
        fs::write(
            &path,
            "logger:\n  prefix: api\n  limitBytes: 2048\n  fileMode: \"0640\"\n",
        )
        .unwrap();
        let logger = load_config(&path).unwrap().logger.unwrap();
        assert_eq!(logger.prefix.unwrap(), "api");
        assert_eq!(logger.limit_bytes, Some(2048));
        assert_eq!(logger.file_mode.unwrap(), "0640");
    }

    #[test]
    fn loads_json_and_toml_by_extension() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("config.json");
        fs::write(&json, r#"{"logger":{"level":"warn"}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().logger.unwrap().level.unwrap(), "warn");

        let toml_path = dir.path().join("config.toml");
        fs::write(&toml_path, "[tracing]\nfilter = \"debug\"\njson = false\n").unwrap();
        let tracing = load_config(&toml_path).unwrap().tracing.unwrap();
        assert_eq!(tracing.filter.unwrap(), "debug");
        assert_eq!(tracing.json, Some(false));
    }

    #[test]
    fn parse_error_mentions_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = format!("{:#}", load_config(&path).unwrap_err());
        assert!(err.contains("broken.json"));
    }
}
