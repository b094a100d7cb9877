//! Configuration management using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::LlmConfig;
use crate::scrapers::{BrowserEngineConfig, ReplyFilters};
use crate::selectors::ReferencePost;

/// Application name used for config discovery and the default data directory.
pub const APP_NAME: &str = "stopthecount";

/// Subdirectory of the platform data directory used by default.
const DATA_SUBDIR: &str = "stc";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STC_DATA_DIR";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path (selectors and scraped threads).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Browser session settings.
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    /// Post used to re-derive selectors.
    #[serde(default)]
    pub reference: ReferencePost,
    /// Optional reply filters.
    #[serde(default)]
    pub filters: ReplyFilters,
    /// LLM configuration for proposal extraction.
    #[serde(default, skip_serializing_if = "LlmConfig::is_default")]
    pub llm: LlmConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load(APP_NAME).await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("{}; using defaults", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(e) => {
                debug!("No config file found ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

/// Runtime settings resolved from config, environment and CLI flags.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    pub browser: BrowserEngineConfig,
    pub reference: ReferencePost,
    pub filters: ReplyFilters,
    pub llm: LlmConfig,
}

impl Settings {
    /// Resolve settings; `data_dir` from the CLI wins over everything else.
    pub fn resolve(config: Config, data_dir: Option<PathBuf>) -> Self {
        let env_dir = std::env::var(DATA_DIR_ENV).ok().filter(|s| !s.is_empty());
        let mut settings = Self::resolve_with(config, data_dir, env_dir);
        settings.browser = settings.browser.with_env_overrides();
        settings
    }

    /// Data directory precedence: CLI flag, env var, config file, platform default.
    fn resolve_with(config: Config, cli_dir: Option<PathBuf>, env_dir: Option<String>) -> Self {
        let base_dir = config
            .base_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let data_dir = cli_dir
            .map(|dir| PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).as_ref()))
            .or_else(|| env_dir.map(|dir| config.resolve_path(&dir, &base_dir)))
            .or_else(|| {
                config
                    .data_dir
                    .as_deref()
                    .map(|dir| config.resolve_path(dir, &base_dir))
            })
            .unwrap_or_else(default_data_dir);

        Self {
            data_dir,
            browser: config.browser,
            reference: config.reference,
            filters: config.filters,
            llm: config.llm,
        }
    }

    /// Create settings with a custom data directory and default everything else.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self::resolve_with(Config::default(), Some(data_dir), None)
    }

    /// Make sure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

/// `<platform data dir>/stc`, falling back to the home directory.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_toml_with_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stopthecount.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "threads"

[browser]
headless = true
settle_delay_ms = 500

[reference]
url = "https://x.com/someone/status/42"

[filters]
max_body_lines = 5

[llm]
max_tokens = 64
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.settle_delay_ms, 500);
        assert_eq!(config.reference.url, "https://x.com/someone/status/42");
        assert_eq!(config.reference.author_anchor, "@StopTheCountBot");
        assert_eq!(config.filters.max_body_lines, Some(5));
        assert_eq!(config.llm.app.max_tokens, 64);
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));

        let settings = Settings::resolve_with(config, None, None);
        assert_eq!(settings.data_dir, dir.path().join("threads"));
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "filters:\n  reject_repeated_lines: true\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert!(config.filters.reject_repeated_lines);

        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"browser": {"max_scroll_rounds": 3}}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.browser.max_scroll_rounds, 3);
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "browser = [").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
    }

    #[test]
    fn test_data_dir_precedence() {
        let config = Config {
            data_dir: Some("/from/config".to_string()),
            ..Default::default()
        };

        let settings = Settings::resolve_with(
            config.clone(),
            Some(PathBuf::from("/from/cli")),
            Some("/from/env".to_string()),
        );
        assert_eq!(settings.data_dir, PathBuf::from("/from/cli"));

        let settings = Settings::resolve_with(config.clone(), None, Some("/from/env".to_string()));
        assert_eq!(settings.data_dir, PathBuf::from("/from/env"));

        let settings = Settings::resolve_with(config, None, None);
        assert_eq!(settings.data_dir, PathBuf::from("/from/config"));
    }

    #[test]
    fn test_default_data_dir_ends_with_stc() {
        let settings = Settings::resolve_with(Config::default(), None, None);
        assert!(settings.data_dir.ends_with(DATA_SUBDIR));
    }
}
