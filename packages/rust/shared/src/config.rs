//! Application configuration for magedocs.
//!
//! User config lives at `~/.magedocs/magedocs.toml`.
//! Environment variables override config file values, CLI flags override both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "magedocs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".magedocs";

/// Default database file name inside the config directory.
const DB_FILE_NAME: &str = "docs.db";

/// Identifying User-Agent sent with every request.
const DEFAULT_USER_AGENT: &str = concat!(
    "magedocs/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/mage-os/devdocs)"
);

// ---------------------------------------------------------------------------
// Config structs (matching magedocs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub crawl: CrawlSettings,

    #[serde(default)]
    pub hyva: HyvaConfig,

    #[serde(default)]
    pub mageos: MageosConfig,

    #[serde(default)]
    pub satoshi: SatoshiConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path. Defaults to `~/.magedocs/docs.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Extra attempts after the first failed one.
    pub retries: u32,
    /// Base of the linear backoff between attempts.
    pub backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.into(),
            retries: 3,
            backoff_ms: 500,
            timeout_secs: 30,
        }
    }
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Pause between consecutive page fetches of one crawl.
    pub request_delay_ms: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            request_delay_ms: 100,
        }
    }
}

/// `[hyva]` section: Hyvä Docs site crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HyvaConfig {
    pub start_url: String,
    pub max_pages: usize,
    pub min_content_length: usize,
}

impl Default for HyvaConfig {
    fn default() -> Self {
        Self {
            start_url: "https://docs.hyva.io/".into(),
            max_pages: 120,
            min_content_length: 80,
        }
    }
}

/// `[mageos]` section: DevDocs site crawl plus the GitHub markdown tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MageosConfig {
    pub site_url: String,
    pub max_pages: usize,
    pub min_content_length: usize,
    pub repo_owner: String,
    pub repo_name: String,
    pub branch: String,
    /// Repository path prefixes whose markdown files are indexed.
    pub include_dirs: Vec<String>,
}

impl Default for MageosConfig {
    fn default() -> Self {
        Self {
            site_url: "https://devdocs.mage-os.org/".into(),
            max_pages: 200,
            min_content_length: 80,
            repo_owner: "mage-os".into(),
            repo_name: "devdocs".into(),
            branch: "main".into(),
            include_dirs: vec!["guides".into(), "src/_data".into()],
        }
    }
}

/// `[satoshi]` section: Notion export plus an optional GitHub repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SatoshiConfig {
    pub notion_url: String,
    /// `owner/name`; the GitHub phase is skipped when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
    pub github_branch: String,
    pub include_paths: Vec<String>,
}

impl Default for SatoshiConfig {
    fn default() -> Self {
        Self {
            notion_url: "https://scandiweb.notion.site/Hyv-Satoshi-theme-documentation-1adc346d72c080ffb1b2faa454d6739d".into(),
            github_repo: Some("scandiweb/satoshi-hyva".into()),
            github_branch: "main".into(),
            include_paths: vec!["README.md".into(), "docs".into()],
        }
    }
}

/// `[github]` section: endpoints and credentials for tree/raw fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub raw_base: String,
    pub web_base: String,
    /// Name of the env var holding a token (never store the token itself).
    pub token_env: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
            raw_base: "https://raw.githubusercontent.com".into(),
            web_base: "https://github.com".into(),
            token_env: "GITHUB_TOKEN".into(),
        }
    }
}

impl GithubConfig {
    /// Read the token from the configured env var, if set and non-empty.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Run all adapters once before serving.
    pub update_on_start: bool,
    /// Six-field cron expression (with seconds) for periodic refreshes.
    pub cron: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            update_on_start: false,
            cron: "0 0 2 * * *".into(),
        }
    }
}

impl AppConfig {
    /// Resolve the database path (`~` expanded, default under the config dir).
    pub fn db_path(&self) -> Result<PathBuf> {
        match self.storage.db_path.as_deref() {
            Some(path) => expand_home(path),
            None => Ok(config_dir()?.join(DB_FILE_NAME)),
        }
    }

    /// Apply environment overrides using `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MAGEDOCS_DB_PATH") {
            self.storage.db_path = Some(v);
        }
        if let Some(v) = lookup("HYVA_DOCS_URL") {
            self.hyva.start_url = v;
        }
        if let Some(v) = lookup("HYVA_MAX_PAGES") {
            self.hyva.max_pages = parse_number("HYVA_MAX_PAGES", &v)?;
        }
        if let Some(v) = lookup("MAGEOS_SITE_URL") {
            self.mageos.site_url = v;
        }
        if let Some(v) = lookup("MAGEOS_REPO_OWNER") {
            self.mageos.repo_owner = v;
        }
        if let Some(v) = lookup("MAGEOS_REPO_NAME") {
            self.mageos.repo_name = v;
        }
        if let Some(v) = lookup("MAGEOS_BRANCH") {
            self.mageos.branch = v;
        }
        if let Some(v) = lookup("MAGEOS_INCLUDE_DIRS") {
            self.mageos.include_dirs = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("SATOSHI_NOTION_URL") {
            self.satoshi.notion_url = v;
        }
        if let Some(v) = lookup("SATOSHI_GITHUB_REPO") {
            self.satoshi.github_repo = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("MAGEDOCS_UPDATE_ON_START") {
            self.server.update_on_start = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Some(v) = lookup("MAGEDOCS_CRON") {
            self.server.cron = v;
        }
        Ok(())
    }
}

fn parse_number(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| DocsError::config(format!("{name}={value:?} is not a number: {e}")))
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| DocsError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.magedocs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DocsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.magedocs/magedocs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk (defaults if absent) and apply env overrides.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    let mut config = if path.exists() {
        load_config_from(&path)?
    } else {
        tracing::debug!(?path, "config file not found, using defaults");
        AppConfig::default()
    };

    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

/// Load the application config from a specific file path (no env overrides).
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("docs.hyva.io"));
        assert!(toml_str.contains("GITHUB_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.hyva.max_pages, 120);
        assert_eq!(parsed.mageos.include_dirs, vec!["guides", "src/_data"]);
        assert_eq!(parsed.http.retries, 3);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[hyva]
max_pages = 10

[storage]
db_path = "/tmp/magedocs/test.db"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.hyva.max_pages, 10);
        assert_eq!(config.hyva.start_url, "https://docs.hyva.io/");
        assert_eq!(config.hyva.min_content_length, 80);
        assert_eq!(
            config.db_path().unwrap(),
            PathBuf::from("/tmp/magedocs/test.db")
        );
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HYVA_MAX_PAGES", "5"),
            ("MAGEOS_INCLUDE_DIRS", "guides, docs ,"),
            ("SATOSHI_GITHUB_REPO", ""),
            ("MAGEDOCS_UPDATE_ON_START", "true"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|name| env.get(name).map(|v| v.to_string()))
            .expect("overrides");

        assert_eq!(config.hyva.max_pages, 5);
        assert_eq!(config.mageos.include_dirs, vec!["guides", "docs"]);
        assert!(config.satoshi.github_repo.is_none());
        assert!(config.server.update_on_start);
    }

    #[test]
    fn env_override_rejects_bad_number() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|name| {
            (name == "HYVA_MAX_PAGES").then(|| "many".to_string())
        });
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HYVA_MAX_PAGES"));
    }
}
