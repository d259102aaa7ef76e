//! Environment variable loading.
//!
//! Keeps the fallback chain (primary → aliases → `.env` → default) in one
//! place instead of repeating `or_else` calls at every read site.

use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Source of configuration values keyed by environment variable name.
pub trait EnvLookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<L: EnvLookup + ?Sized> EnvLookup for &L {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Process environment layered over the contents of a `.env` file.
///
/// Variables already set in the process win; the file only fills gaps.
#[derive(Debug, Clone, Default)]
pub struct DotenvLayer {
    file: HashMap<String, String>,
}

impl DotenvLayer {
    pub fn from_vars(file: HashMap<String, String>) -> Self {
        Self { file }
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }
}

impl EnvLookup for DotenvLayer {
    fn get(&self, key: &str) -> Option<String> {
        usable_var(key, env::var(key)).or_else(|| self.file.get(key).cloned())
    }
}

/// A process variable that is not valid UTF-8 counts as unset, with a warning.
fn usable_var(key: &str, value: Result<String, env::VarError>) -> Option<String> {
    match value {
        Ok(v) => Some(v),
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(raw)) => {
            tracing::warn!(
                "Ignoring {}: value is not valid UTF-8 ({})",
                key,
                raw.to_string_lossy()
            );
            None
        }
    }
}

/// Load `<dir>/.env` (missing or unreadable files yield an empty layer).
pub fn load_dotenv(dir: &Path) -> DotenvLayer {
    let path = dir.join(".env");
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let vars = parse_dotenv(&content);
            tracing::debug!("Loaded {} variable(s) from {}", vars.len(), path.display());
            DotenvLayer::from_vars(vars)
        }
        Err(_) => DotenvLayer::default(),
    }
}

/// Parse `KEY=value` lines; `#` comments, blank lines and surrounding quotes are handled.
pub fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
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
        // Strip inline comment (# not inside quotes)
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
            vars.insert(key.to_string(), value.to_string());
        }
    }
    vars
}

fn first_set(env: &impl EnvLookup, primary: &str, aliases: &[&str]) -> Option<String> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .filter_map(|key| env.get(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Read the primary variable or the first set alias, falling back to `default`.
pub fn env_or<F>(env: &impl EnvLookup, primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    first_set(env, primary, aliases).unwrap_or_else(default)
}

/// Read the primary variable or an alias; empty values count as unset.
pub fn env_optional(env: &impl EnvLookup, primary: &str, aliases: &[&str]) -> Option<String> {
    first_set(env, primary, aliases)
}

/// Boolean variable: `0/false/no/off` are false, any other non-empty value is true.
pub fn env_bool(env: &impl EnvLookup, primary: &str, aliases: &[&str], default: bool) -> bool {
    match first_set(env, primary, aliases) {
        Some(s) => !matches!(
            s.to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_dotenv_quotes_and_comments() {
        let parsed = parse_dotenv(
            "# comment\n\
             BOOTPY_MODULE=cutekit # trailing\n\
             export BOOTPY_ENV_DIR=\"/tools/venv\"\n\
             BOOTPY_PACKAGE_REV='v0.7.1'\n\
             not a pair\n",
        );
        assert_eq!(parsed.get("BOOTPY_MODULE").unwrap(), "cutekit");
        assert_eq!(parsed.get("BOOTPY_ENV_DIR").unwrap(), "/tools/venv");
        assert_eq!(parsed.get("BOOTPY_PACKAGE_REV").unwrap(), "v0.7.1");
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_env_optional_empty_is_unset() {
        let env = vars(&[("A", "  "), ("B", "value")]);
        assert_eq!(env_optional(&env, "A", &[]), None);
        assert_eq!(env_optional(&env, "A", &["B"]), Some("value".to_string()));
    }

    #[test]
    fn test_env_or_primary_wins_over_alias() {
        let env = vars(&[("PRIMARY", "p"), ("ALIAS", "a")]);
        assert_eq!(env_or(&env, "PRIMARY", &["ALIAS"], || "d".into()), "p");
        assert_eq!(env_or(&env, "MISSING", &[], || "d".into()), "d");
    }

    #[test]
    fn test_env_bool() {
        let env = vars(&[("T", "yes"), ("F", "Off"), ("E", "")]);
        assert!(env_bool(&env, "T", &[], false));
        assert!(!env_bool(&env, "F", &[], true));
        assert!(env_bool(&env, "E", &[], true));
        assert!(!env_bool(&env, "UNSET", &[], false));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_process_value_is_unset() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"/tools/\xffvenv".to_vec());
        assert_eq!(usable_var("BOOTPY_ENV_DIR", Err(env::VarError::NotUnicode(raw))), None);
        assert_eq!(usable_var("BOOTPY_ENV_DIR", Err(env::VarError::NotPresent)), None);
        assert_eq!(
            usable_var("BOOTPY_ENV_DIR", Ok("/tools/venv".to_string())),
            Some("/tools/venv".to_string())
        );
    }

    #[test]
    fn test_load_dotenv_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dotenv(dir.path()).is_empty());
    }
}
