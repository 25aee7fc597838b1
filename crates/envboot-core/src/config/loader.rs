//! Environment variable loading.
//!
//! Keeps the alias / fallback chains in one place so callers never touch
//! `std::env::var` directly.

use std::env;
use std::path::Path;

/// Load `<dir>/.env` into the process environment without overriding
/// variables that are already set. Runs at most once per process.
pub fn load_dotenv_from_dir(dir: &Path) {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let Ok(content) = std::fs::read_to_string(dir.join(".env")) else {
            return;
        };
        for (key, value) in parse_dotenv(&content) {
            if env::var(&key).is_err() {
                set_env_var(&key, &value);
            }
        }
    });
}

/// Parse `KEY=value` lines. Quotes around the value are stripped and an
/// unquoted ` #` starts a trailing comment.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read the primary key or the first set alias, falling back to `default`.
/// Empty values count as unset.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env_optional(primary, aliases).unwrap_or_else(default)
}

/// Read the primary key or the first set alias; empty values are `None`.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Boolean variable: `0`/`false`/`no`/`off` are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => parse_bool(s),
        None => default,
    }
}

fn parse_bool(s: &str) -> bool {
    !matches!(
        s.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

// All process-environment mutation goes through here.
// SAFETY contract: call before any threads are spawned.

#[allow(unsafe_code)]
pub fn set_env_var(key: &str, value: &str) {
    unsafe { env::set_var(key, value) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotenv_strips_quotes_and_comments() {
        let content = r#"
# comment
ENVBOOT_PYTHON_VERSION=3.11
export ENVBOOT_VENV_DIR=".env-dir"
ENVBOOT_INDEX_URL=https://mirror.example/simple # local mirror
BROKEN_LINE
ENVBOOT_LOG_LEVEL='envboot=debug'
"#;
        let pairs = parse_dotenv(content);
        assert_eq!(
            pairs,
            vec![
                ("ENVBOOT_PYTHON_VERSION".to_string(), "3.11".to_string()),
                ("ENVBOOT_VENV_DIR".to_string(), ".env-dir".to_string()),
                (
                    "ENVBOOT_INDEX_URL".to_string(),
                    "https://mirror.example/simple".to_string()
                ),
                ("ENVBOOT_LOG_LEVEL".to_string(), "envboot=debug".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(" off "));
        assert!(!parse_bool("No"));
    }

    #[test]
    fn test_env_optional_unset_is_none() {
        assert_eq!(
            env_optional("ENVBOOT_TEST_DEFINITELY_UNSET", &["ENVBOOT_TEST_ALSO_UNSET"]),
            None
        );
        assert_eq!(
            env_or("ENVBOOT_TEST_DEFINITELY_UNSET", &[], || "fallback".to_string()),
            "fallback"
        );
    }
}
