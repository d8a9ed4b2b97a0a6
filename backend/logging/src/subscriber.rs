//! Tracing Subscriber
//!
//! Installs a global `tracing` subscriber whose file output goes through a
//! [`FileSizeRotator`], plus an optional console layer.

use std::sync::Mutex;

use anyhow::{Context, Result};
use rotalog_config::TracingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::file_rotator::{parse_file_mode, FileSizeRotator, DEFAULT_FILE_MODE, DEFAULT_EXTENSION};

/// Build the rotating file sink described by `config`.
pub fn rotating_writer(config: &TracingConfig) -> Result<Mutex<FileSizeRotator>> {
    let mode = match config.file_mode.as_deref() {
        Some(mode) => parse_file_mode(mode).context("Invalid tracing fileMode")?,
        None => DEFAULT_FILE_MODE,
    };
    let mut rotator = FileSizeRotator::new(
        config.directory.as_deref().unwrap_or(""),
        config.prefix.as_deref().unwrap_or("rotalog"),
        DEFAULT_EXTENSION,
        config.limit_bytes.unwrap_or(0),
    )
    .with_mode(mode);
    // open eagerly so a bad directory fails here rather than on the first event
    rotator
        .rotate()
        .with_context(|| format!("Failed to open tracing log in {}", rotator.dir().display()))?;
    Ok(Mutex::new(rotator))
}

/// Initialize the global subscriber. `RUST_LOG` overrides the configured
/// filter. Calling this twice leaves the first subscriber in place.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.as_deref().unwrap_or("info")));

    let writer = rotating_writer(config)?;
    let file_layer = if config.json.unwrap_or(true) {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer().with_writer(writer).with_ansi(false).boxed()
    };

    let console_layer = config.console.unwrap_or(true).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn writer_opens_first_file_in_directory() {
        let dir = TempDir::new().unwrap();
        let config = TracingConfig {
            directory: Some(dir.path().display().to_string()),
            prefix: Some("trace".into()),
            limit_bytes: Some(4096),
            ..Default::default()
        };
        let writer = rotating_writer(&config).unwrap();
        let mut rotator = writer.into_inner().unwrap();
        let path = rotator.current_handle().unwrap().path().to_path_buf();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("trace_"));

        rotator.write_all(b"{\"msg\":\"x\"}\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{\"msg\":\"x\"}\n");
    }

    #[test]
    fn bad_directory_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = TracingConfig {
            directory: Some(dir.path().join("absent").display().to_string()),
            ..Default::default()
        };
        let err = rotating_writer(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to open tracing log"));
    }
}
