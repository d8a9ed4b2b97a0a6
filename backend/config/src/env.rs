//! Environment variable substitution for config values.
//!
//! String values may reference `${VAR_NAME}` (uppercase `[A-Z_][A-Z0-9_]*`),
//! typically in `directory`. `$${VAR}` is kept as a literal `${VAR}`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

/// Matches `${VAR}` and its escaped form `$${VAR}`.
static REFERENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in every string leaf of `value`.
///
/// Fails on the first variable that is unset or empty.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    Ok(substitute_value(value, env, "")?)
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let replaced = REFERENCE_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        if caps[0].starts_with("$$") {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(replaced.into_owned()),
    }
}

/// Check whether a string contains any unescaped env var reference.
pub fn contains_env_var_reference(s: &str) -> bool {
    REFERENCE_PATTERN
        .captures_iter(s)
        .any(|caps| !caps[0].starts_with("$$"))
}

/// All env var names referenced in a value tree, sorted and deduplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(
            REFERENCE_PATTERN
                .captures_iter(s)
                .filter(|caps| !caps[0].starts_with("$$"))
                .map(|caps| caps[1].to_string()),
        ),
        Value::Array(items) => items.iter().for_each(|v| collect_vars(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_directory() {
        let v = json!({"logger": {"directory": "${LOG_ROOT}/svc"}});
        let result = resolve_env_vars_with(&v, &env(&[("LOG_ROOT", "/var/log")])).unwrap();
        assert_eq!(result["logger"]["directory"], "/var/log/svc");
    }

    #[test]
    fn missing_var_names_variable_and_path() {
        let v = json!({"logger": {"directory": "${MISSING_DIR}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_DIR"));
        assert!(err.contains("logger.directory"));
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"header": "$${LEVEL} ${NAME}"});
        let result = resolve_env_vars_with(&v, &env(&[("NAME", "api")])).unwrap();
        assert_eq!(result["header"], "${LEVEL} api");
    }

    #[test]
    fn header_placeholders_are_not_env_vars() {
        let v = json!({"header": "${level} ${time_rfc3339}"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["header"], "${level} ${time_rfc3339}");
    }

    #[test]
    fn collects_referenced_vars() {
        let v = json!({"a": "${FOO}", "b": ["${BAR}", "$${SKIP}"], "c": "${FOO}"});
        assert_eq!(collect_referenced_vars(&v), vec!["BAR", "FOO"]);
        assert!(contains_env_var_reference("${FOO}"));
        assert!(!contains_env_var_reference("$${FOO}"));
    }
}
