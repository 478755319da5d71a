use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::sql::Backend;
use crate::filters::{DEFAULT_TRUTHY_TOKENS, TruthyTokens};
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub dialect: Option<Backend>,
    pub truthy_tokens: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if other.dialect.is_some() {
            tracing::trace!(dialect = ?other.dialect, "Merging dialect");
            self.dialect = other.dialect;
        }
        if other.truthy_tokens.is_some() {
            tracing::trace!(tokens = ?other.truthy_tokens, "Merging truthy_tokens");
            self.truthy_tokens = other.truthy_tokens;
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dialect: Backend,
    pub truthy_tokens: Vec<String>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.querysift/querysift.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let profile = get_profile_config_path();
        Self::load_with_profile(cli, profile.as_deref())
    }

    fn load_with_profile(cli: &CliConfig, profile: Option<&Path>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = profile
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer configs: defaults -> file config -> CLI/env overrides
        let dialect = cli.dialect.or(file_config.dialect).unwrap_or_default();

        let truthy_tokens = cli
            .truthy
            .clone()
            .or(file_config.truthy_tokens)
            .unwrap_or_else(|| DEFAULT_TRUTHY_TOKENS.iter().map(|t| t.to_string()).collect());

        let config = Self {
            dialect,
            truthy_tokens,
        };
        config.validate()?;

        tracing::debug!(
            dialect = %config.dialect,
            truthy_tokens = config.truthy_tokens.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Token set for boolean coercion
    pub fn truthy(&self) -> TruthyTokens {
        TruthyTokens::new(self.truthy_tokens.iter().cloned())
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.truthy_tokens.is_empty() {
            anyhow::bail!("Configuration error: truthy_tokens must not be empty");
        }

        // Blank tokens never match anything but usually signal a typo
        if self.truthy_tokens.iter().any(|t| t.trim().is_empty()) {
            tracing::warn!("truthy_tokens contains a blank entry, it will match empty input");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.querysift/querysift.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Scalar;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_file_config_parse() {
        let json = r#"{ "dialect": "sqlite", "truthy_tokens": ["yes"] }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dialect, Some(Backend::Sqlite));
        assert_eq!(config.truthy_tokens, Some(vec!["yes".to_string()]));
    }

    #[test]
    fn test_file_config_unknown_fields_collected() {
        let json = r#"{ "dialekt": "sqlite" }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert!(config.dialect.is_none());
        assert!(config.extra.get("dialekt").is_some());
    }

    #[test]
    fn test_file_config_invalid_dialect() {
        let json = r#"{ "dialect": "oracle" }"#;
        assert!(serde_json::from_str::<FileConfig>(json).is_err());
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let missing_profile = dir.path().join("nope.json");
        let cli = CliConfig {
            config: Some(write(&dir, "empty.json", "{}")),
            ..Default::default()
        };
        let config = AppConfig::load_with_profile(&cli, Some(&missing_profile)).unwrap();

        assert_eq!(config.dialect, Backend::Postgres);
        assert_eq!(config.truthy_tokens.len(), DEFAULT_TRUTHY_TOKENS.len());
        assert!(config.truthy().is_truthy(&Scalar::from("да")));
    }

    #[test]
    fn test_layering_profile_file_cli() {
        let dir = TempDir::new().unwrap();
        let profile = write(
            &dir,
            "profile.json",
            r#"{ "dialect": "duckdb", "truthy_tokens": ["oui"] }"#,
        );
        let overlay = write(&dir, "overlay.json", r#"{ "dialect": "clickhouse" }"#);

        let cli = CliConfig {
            config: Some(overlay.clone()),
            ..Default::default()
        };
        let config = AppConfig::load_with_profile(&cli, Some(&profile)).unwrap();
        assert_eq!(config.dialect, Backend::Clickhouse);
        assert_eq!(config.truthy_tokens, vec!["oui".to_string()]);

        let cli = CliConfig {
            config: Some(overlay),
            dialect: Some(Backend::Sqlite),
            truthy: Some(vec!["y".to_string()]),
        };
        let config = AppConfig::load_with_profile(&cli, Some(&profile)).unwrap();
        assert_eq!(config.dialect, Backend::Sqlite);
        assert!(config.truthy().is_truthy(&Scalar::from("y")));
        assert!(!config.truthy().is_truthy(&Scalar::from("oui")));
    }

    #[test]
    fn test_missing_cli_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            config: Some(dir.path().join("missing.json")),
            ..Default::default()
        };
        let err = AppConfig::load_with_profile(&cli, None).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_empty_truthy_tokens_rejected() {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            config: Some(write(&dir, "c.json", r#"{ "truthy_tokens": [] }"#)),
            ..Default::default()
        };
        let err = AppConfig::load_with_profile(&cli, None).unwrap_err();
        assert!(err.to_string().contains("truthy_tokens"));
    }

    #[test]
    fn test_malformed_config_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.json", "{ not json");
        let cli = CliConfig {
            config: Some(path.clone()),
            ..Default::default()
        };
        let err = AppConfig::load_with_profile(&cli, None).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
