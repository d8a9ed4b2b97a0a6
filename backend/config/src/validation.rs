//! Config validation with path-qualified messages.

use crate::schema::{LoggerConfig, RotalogConfig, TracingConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Placeholders a header template may reference.
pub const HEADER_PLACEHOLDERS: &[&str] = &[
    "time_rfc3339",
    "level",
    "prefix",
    "short_file",
    "long_file",
    "line",
];

const LEVELS: &[&str] = &["debug", "info", "warn", "error", "off"];

/// Limits below this rotate on nearly every line.
const SMALL_LIMIT_BYTES: u64 = 1024;

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &RotalogConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    if let Some(logger) = &config.logger {
        validate_logger(logger, &mut report);
    }
    if let Some(tracing) = &config.tracing {
        validate_tracing(tracing, &mut report);
    }
    report
}

fn validate_logger(logger: &LoggerConfig, report: &mut ValidationReport) {
    if let Some(level) = &logger.level {
        if !LEVELS.contains(&level.trim().to_ascii_lowercase().as_str()) {
            report.error(
                "logger.level",
                format!("Unknown level '{level}'. Use 'debug', 'info', 'warn', 'error' or 'off'"),
            );
        }
    }
    if let Some(mode) = &logger.file_mode {
        validate_file_mode("logger.fileMode", mode, report);
    }
    if let Some(ext) = &logger.extension {
        if ext.is_empty() {
            report.error("logger.extension", "extension cannot be empty");
        } else if ext.contains('.') || ext.contains(std::path::is_separator) {
            report.error(
                "logger.extension",
                format!("extension '{ext}' must not contain '.' or a path separator"),
            );
        }
    }
    if let Some(prefix) = &logger.prefix {
        validate_prefix("logger.prefix", prefix, report);
    }
    if let Some(limit) = logger.limit_bytes {
        validate_limit("logger.limitBytes", limit, report);
    }
    if let Some(header) = &logger.header {
        for caps in PLACEHOLDER_PATTERN.captures_iter(header) {
            let name = &caps[1];
            if !HEADER_PLACEHOLDERS.contains(&name) {
                report.warn(
                    "logger.header",
                    format!("Unknown placeholder '${{{name}}}' renders as empty text"),
                );
            }
        }
    }
}

fn validate_tracing(tracing: &TracingConfig, report: &mut ValidationReport) {
    if let Some(filter) = &tracing.filter {
        if filter.trim().is_empty() {
            report.error("tracing.filter", "filter cannot be empty");
        }
    }
    if let Some(mode) = &tracing.file_mode {
        validate_file_mode("tracing.fileMode", mode, report);
    }
    if let Some(prefix) = &tracing.prefix {
        validate_prefix("tracing.prefix", prefix, report);
    }
    if let Some(limit) = tracing.limit_bytes {
        validate_limit("tracing.limitBytes", limit, report);
    }
}

fn validate_file_mode(path: &str, mode: &str, report: &mut ValidationReport) {
    let trimmed = mode.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    match u32::from_str_radix(digits, 8) {
        Ok(bits) if bits <= 0o7777 => {}
        Ok(_) => report.error(path, format!("fileMode '{mode}' is out of range")),
        Err(_) => report.error(path, format!("fileMode '{mode}' is not an octal number")),
    }
}

fn validate_prefix(path: &str, prefix: &str, report: &mut ValidationReport) {
    if prefix.contains(std::path::is_separator) {
        report.error(path, format!("prefix '{prefix}' must not contain a path separator"));
    }
}

fn validate_limit(path: &str, limit: u64, report: &mut ValidationReport) {
    if limit > 0 && limit < SMALL_LIMIT_BYTES {
        report.warn(
            path,
            format!("limit of {limit} bytes will rotate on almost every line"),
        );
    }
}
