//! API credential resolution.
//!
//! The key is read from the process environment only. A `.env` file may seed
//! the environment first; variables that are already set always win.

use std::fmt;
use std::path::Path;

use dizan_common::ConfigError;
use tracing::{debug, info};

/// Environment variable holding the Generative Language API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Opaque API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Read the API key from the process environment.
pub fn api_key_from_env() -> Result<ApiKey, ConfigError> {
    api_key_from_lookup(|name| std::env::var(name).ok())
}

/// Resolve the API key through `lookup`, rejecting absent or blank values.
pub fn api_key_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ApiKey, ConfigError> {
    match lookup(API_KEY_ENV) {
        Some(value) if !value.trim().is_empty() => Ok(ApiKey(value.trim().to_string())),
        _ => Err(ConfigError::MissingCredential(API_KEY_ENV.into())),
    }
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
/// Surrounding quotes on values are stripped.
pub fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Load a `.env` file into the process environment without overriding
/// variables that are already set. Returns how many variables were applied.
///
/// Must run before any threads are spawned.
pub fn load_dotenv(path: &Path) -> usize {
    let Ok(contents) = std::fs::read_to_string(path) else {
        debug!(path = %path.display(), "no .env file");
        return 0;
    };

    let mut applied = 0;
    for (key, value) in parse_dotenv(&contents) {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, value);
            applied += 1;
        }
    }
    info!(path = %path.display(), applied, "loaded .env");
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_config_error() {
        let err = api_key_from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(ref var) if var == API_KEY_ENV));
    }

    #[test]
    fn blank_key_is_treated_as_missing() {
        let err = api_key_from_lookup(|_| Some("   ".into())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn key_is_trimmed() {
        let key = api_key_from_lookup(|name| {
            assert_eq!(name, "GOOGLE_API_KEY");
            Some(" abc123 \n".into())
        })
        .unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn debug_redacts_key() {
        let key = api_key_from_lookup(|_| Some("super-secret".into())).unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn parse_dotenv_handles_comments_quotes_and_export() {
        let parsed = parse_dotenv(
            "# comment\n\nGOOGLE_API_KEY=\"abc\"\nexport OTHER='x y'\nBROKEN\n=novalue\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("GOOGLE_API_KEY".to_string(), "abc".to_string()),
                ("OTHER".to_string(), "x y".to_string()),
            ]
        );
    }

    #[test]
    fn load_dotenv_missing_file_applies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_dotenv(&dir.path().join(".env")), 0);
    }

    #[test]
    fn load_dotenv_does_not_override_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "DIZAN_DOTENV_PRESET=replaced\nDIZAN_DOTENV_FRESH=1\n",
        )
        .unwrap();

        std::env::set_var("DIZAN_DOTENV_PRESET", "kept");
        let applied = load_dotenv(&path);
        assert_eq!(applied, 1);
        assert_eq!(std::env::var("DIZAN_DOTENV_PRESET").unwrap(), "kept");
        assert_eq!(std::env::var("DIZAN_DOTENV_FRESH").unwrap(), "1");
    }
}
