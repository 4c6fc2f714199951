//! Connection settings for the GIMS API.
//!
//! Settings are layered:
//! 1. `~/.config/gims/config.toml` (optional)
//! 2. `GIMS_*` environment variables (override the file)
//!
//! Credentials are required; there is no anonymous mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GimsError, Result};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_URL: &str = "GIMS_URL";
pub const ENV_ACCESS_TOKEN: &str = "GIMS_ACCESS_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "GIMS_REFRESH_TOKEN";
pub const ENV_VERIFY_SSL: &str = "GIMS_VERIFY_SSL";
pub const ENV_TIMEOUT_SECS: &str = "GIMS_TIMEOUT_SECS";

/// On-disk form of the settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub verify_ssl: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// `<config_dir>/gims/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gims").join("config.toml"))
    }

    /// Load the file at `path`; a missing file yields empty settings.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| GimsError::io(path, e))?;
        Self::parse(&content).map_err(|detail| GimsError::Format {
            path: path.to_path_buf(),
            detail,
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.message().to_string())
    }
}

/// Validated connection settings.
#[derive(Debug, Clone)]
pub struct GimsConfig {
    /// System URL without trailing slash, e.g. `https://gims.example.org`
    pub url: String,
    pub access_token: String,
    pub refresh_token: String,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

impl GimsConfig {
    /// Load from the default config file and the process environment.
    pub fn load() -> Result<Self> {
        let file = match ConfigFile::default_path() {
            Some(path) => ConfigFile::load_from(&path)?,
            None => ConfigFile::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge file settings with an environment lookup and validate.
    pub fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let url = lookup(ENV_URL)
            .or(file.url)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GimsError::Config(format!("{ENV_URL} not set")))?;
        let access_token = lookup(ENV_ACCESS_TOKEN)
            .or(file.access_token)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| GimsError::Config(format!("{ENV_ACCESS_TOKEN} not set")))?;
        let refresh_token = lookup(ENV_REFRESH_TOKEN)
            .or(file.refresh_token)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| GimsError::Config(format!("{ENV_REFRESH_TOKEN} not set")))?;

        let verify_ssl = match lookup(ENV_VERIFY_SSL) {
            Some(raw) => parse_flag(&raw),
            None => file.verify_ssl.unwrap_or(true),
        };

        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                GimsError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))
            })?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let url = url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&url)
            .map_err(|e| GimsError::Config(format!("{ENV_URL} is not a valid URL: {e}")))?;

        Ok(Self {
            url,
            access_token,
            refresh_token,
            verify_ssl,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Root of the automation REST API.
    pub fn api_base_url(&self) -> String {
        format!("{}/automation", self.url)
    }

    pub fn token_refresh_url(&self) -> String {
        format!("{}/security/token/refresh/", self.url)
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_URL, "https://gims.example.org/"),
            (ENV_ACCESS_TOKEN, "access"),
            (ENV_REFRESH_TOKEN, "refresh"),
        ]
    }

    #[test]
    fn env_only_config_strips_trailing_slash() {
        let config = GimsConfig::from_sources(ConfigFile::default(), env_of(&full_env())).unwrap();
        assert_eq!(config.url, "https://gims.example.org");
        assert_eq!(config.api_base_url(), "https://gims.example.org/automation");
        assert_eq!(
            config.token_refresh_url(),
            "https://gims.example.org/security/token/refresh/"
        );
        assert!(config.verify_ssl);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let env = env_of(&[(ENV_ACCESS_TOKEN, "a"), (ENV_REFRESH_TOKEN, "r")]);
        let err = GimsConfig::from_sources(ConfigFile::default(), env).unwrap_err();
        assert!(matches!(err, GimsError::Config(ref msg) if msg == "GIMS_URL not set"));
    }

    #[test]
    fn empty_refresh_token_counts_as_missing() {
        let env = env_of(&[
            (ENV_URL, "https://gims.example.org"),
            (ENV_ACCESS_TOKEN, "a"),
            (ENV_REFRESH_TOKEN, ""),
        ]);
        let err = GimsConfig::from_sources(ConfigFile::default(), env).unwrap_err();
        assert_eq!(err.detail().as_deref(), Some("GIMS_REFRESH_TOKEN not set"));
    }

    #[test]
    fn verify_ssl_falsy_spellings() {
        for raw in ["false", "0", "NO", "Off"] {
            let mut pairs = full_env();
            pairs.push((ENV_VERIFY_SSL, raw));
            let config = GimsConfig::from_sources(ConfigFile::default(), env_of(&pairs)).unwrap();
            assert!(!config.verify_ssl, "{raw} should disable verification");
        }
    }

    #[test]
    fn env_overrides_file() {
        let file = ConfigFile {
            url: Some("https://from-file.example.org".into()),
            access_token: Some("file-access".into()),
            refresh_token: Some("file-refresh".into()),
            verify_ssl: Some(false),
            timeout_secs: Some(5),
        };
        let config = GimsConfig::from_sources(
            file,
            env_of(&[(ENV_URL, "https://from-env.example.org")]),
        )
        .unwrap();
        assert_eq!(config.url, "https://from-env.example.org");
        assert_eq!(config.access_token, "file-access");
        assert!(!config.verify_ssl);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let env = env_of(&[
            (ENV_URL, "not a url"),
            (ENV_ACCESS_TOKEN, "a"),
            (ENV_REFRESH_TOKEN, "r"),
        ]);
        assert!(matches!(
            GimsConfig::from_sources(ConfigFile::default(), env),
            Err(GimsError::Config(_))
        ));
    }

    #[test]
    fn config_file_parses_toml() {
        let file = ConfigFile::parse(
            r#"
url = "https://gims.example.org"
verify_ssl = false
timeout_secs = 10
"#,
        )
        .unwrap();
        assert_eq!(file.url.as_deref(), Some("https://gims.example.org"));
        assert_eq!(file.verify_ssl, Some(false));
        assert_eq!(file.timeout_secs, Some(10));
        assert!(file.access_token.is_none());
    }
}
