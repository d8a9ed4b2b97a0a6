//! Config defaults: fills in every unset field.

use crate::schema::{LoggerConfig, RotalogConfig, TracingConfig};

pub const DEFAULT_PREFIX: &str = "app";
pub const DEFAULT_EXTENSION: &str = "log";

/// 100 MiB.
pub const DEFAULT_LIMIT_BYTES: u64 = 100 << 20;

pub const DEFAULT_LEVEL: &str = "info";

pub const DEFAULT_FILE_MODE: &str = "0755";

/// JSON header with time, level, prefix and call site.
pub const DEFAULT_HEADER: &str = r#"{"time":"${time_rfc3339}","level":"${level}","prefix":"${prefix}","file":"${short_file}","line":"${line}"}"#;

pub const DEFAULT_TRACING_FILTER: &str = "info";
pub const DEFAULT_TRACING_PREFIX: &str = "rotalog";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: RotalogConfig) -> RotalogConfig {
    let config = apply_logger_defaults(config);
    apply_tracing_defaults(config)
}

fn apply_logger_defaults(mut config: RotalogConfig) -> RotalogConfig {
    let logger = config.logger.get_or_insert_with(LoggerConfig::default);
    logger.directory.get_or_insert_with(String::new);
    if logger.prefix.as_deref().map_or(true, str::is_empty) {
        logger.prefix = Some(DEFAULT_PREFIX.to_string());
    }
    if logger.extension.as_deref().map_or(true, str::is_empty) {
        logger.extension = Some(DEFAULT_EXTENSION.to_string());
    }
    if logger.limit_bytes.map_or(true, |n| n == 0) {
        logger.limit_bytes = Some(DEFAULT_LIMIT_BYTES);
    }
    logger.level.get_or_insert_with(|| DEFAULT_LEVEL.to_string());
    logger.header.get_or_insert_with(|| DEFAULT_HEADER.to_string());
    logger.color.get_or_insert(true);
    logger.file_mode.get_or_insert_with(|| DEFAULT_FILE_MODE.to_string());
    config
}

fn apply_tracing_defaults(mut config: RotalogConfig) -> RotalogConfig {
    let tracing = config.tracing.get_or_insert_with(TracingConfig::default);
    tracing.filter.get_or_insert_with(|| DEFAULT_TRACING_FILTER.to_string());
    tracing.directory.get_or_insert_with(String::new);
    tracing.prefix.get_or_insert_with(|| DEFAULT_TRACING_PREFIX.to_string());
    if tracing.limit_bytes.map_or(true, |n| n == 0) {
        tracing.limit_bytes = Some(DEFAULT_LIMIT_BYTES);
    }
    tracing.file_mode.get_or_insert_with(|| DEFAULT_FILE_MODE.to_string());
    tracing.json.get_or_insert(true);
    tracing.console.get_or_insert(true);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_logger_defaults() {
        let cfg = apply_all_defaults(RotalogConfig::default());
        let logger = cfg.logger.unwrap();
        assert_eq!(logger.prefix.unwrap(), "app");
        assert_eq!(logger.extension.unwrap(), "log");
        assert_eq!(logger.limit_bytes.unwrap(), 100 * 1024 * 1024);
        assert_eq!(logger.level.unwrap(), "info");
        assert_eq!(logger.file_mode.unwrap(), "0755");
        assert_eq!(logger.color, Some(true));
        assert_eq!(logger.directory.unwrap(), "");
    }

    #[test]
    fn zero_limit_means_default() {
        let mut cfg = RotalogConfig::default();
        cfg.logger = Some(LoggerConfig {
            limit_bytes: Some(0),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.logger.unwrap().limit_bytes.unwrap(), DEFAULT_LIMIT_BYTES);
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = RotalogConfig::default();
        cfg.logger = Some(LoggerConfig {
            prefix: Some("svc".to_string()),
            limit_bytes: Some(4096),
            color: Some(false),
            ..Default::default()
        });
        let logger = apply_all_defaults(cfg).logger.unwrap();
        assert_eq!(logger.prefix.unwrap(), "svc");
        assert_eq!(logger.limit_bytes.unwrap(), 4096);
        assert_eq!(logger.color, Some(false));
    }
}
