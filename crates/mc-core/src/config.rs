use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `usage.prompts_dir`.
pub const PROMPTS_DIR_ENV: &str = "TOKENTAP_PROMPTS_DIR";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// UsageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: String,
    #[serde(default = "default_max_recent")]
    pub max_recent: usize,
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
}

fn default_prompts_dir() -> String {
    paths::DEFAULT_PROMPTS_DIR.to_string()
}

fn default_ledger_dir() -> String {
    paths::DEFAULT_LEDGER_DIR.to_string()
}

fn default_max_recent() -> usize {
    50
}

fn default_preview_limit() -> usize {
    180
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            prompts_dir: default_prompts_dir(),
            ledger_dir: default_ledger_dir(),
            max_recent: default_max_recent(),
            preview_limit: default_preview_limit(),
        }
    }
}

impl UsageConfig {
    pub fn parse_options(&self) -> crate::tokentap::ParseOptions {
        crate::tokentap::ParseOptions {
            max_recent: self.max_recent,
            preview_limit: self.preview_limit,
        }
    }
}

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Binary invoked as `<cli> cron list --json` when the HTTP endpoint fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli: Option<String>,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:18789".to_string()
}

fn default_gateway_timeout() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            cli: None,
            timeout_secs: default_gateway_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_memory_dir")]
    pub memory_dir: String,
    #[serde(default = "default_cron_store")]
    pub cron_store: String,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

fn default_docs_dir() -> String {
    paths::DEFAULT_DOCS_DIR.to_string()
}

fn default_config_dir() -> String {
    paths::DEFAULT_CONFIG_DIR.to_string()
}

fn default_memory_dir() -> String {
    paths::DEFAULT_MEMORY_DIR.to_string()
}

fn default_cron_store() -> String {
    paths::DEFAULT_CRON_STORE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            docs_dir: default_docs_dir(),
            config_dir: default_config_dir(),
            memory_dir: default_memory_dir(),
            cron_store: default_cron_store(),
            usage: UsageConfig::default(),
            gateway: GatewayConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load `.mission-control/config.yaml`, falling back to defaults when the
    /// file does not exist. A dashboard with no config file is still usable.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let Some(data) = crate::io::read_optional(&path)? else {
            return Ok(Self::default());
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Write this config unless a config file already exists. Returns true
    /// if it was written.
    pub fn save_if_missing(&self, root: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(self)?;
        crate::io::write_if_missing(&paths::config_path(root), data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Resolved locations
    // -----------------------------------------------------------------------

    pub fn docs_root(&self, root: &Path) -> Result<PathBuf> {
        paths::resolve_configured(root, &self.docs_dir)
    }

    pub fn config_files_dir(&self, root: &Path) -> Result<PathBuf> {
        paths::resolve_configured(root, &self.config_dir)
    }

    pub fn memory_root(&self, root: &Path) -> Result<PathBuf> {
        paths::resolve_configured(root, &self.memory_dir)
    }

    pub fn cron_store_path(&self, root: &Path) -> Result<PathBuf> {
        paths::resolve_configured(root, &self.cron_store)
    }

    pub fn ledger_dir(&self, root: &Path) -> Result<PathBuf> {
        paths::resolve_configured(root, &self.usage.ledger_dir)
    }

    /// `TOKENTAP_PROMPTS_DIR` wins over the configured prompts directory.
    pub fn prompts_dir(&self, root: &Path) -> Result<PathBuf> {
        match std::env::var(PROMPTS_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => paths::resolve_configured(root, dir.trim()),
            _ => paths::resolve_configured(root, &self.usage.prompts_dir),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !(self.gateway.url.starts_with("http://") || self.gateway.url.starts_with("https://"))
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "gateway.url '{}' must start with http:// or https://",
                    self.gateway.url
                ),
            });
        }

        if self.gateway.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "gateway.timeout_secs is 0; requests will time out immediately".into(),
            });
        }

        if self.usage.max_recent == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "usage.max_recent is 0; the recent list will always be empty".into(),
            });
        }

        if self.usage.preview_limit == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "usage.preview_limit is 0; prompt previews will be truncated to '...'"
                    .into(),
            });
        }

        match self.docs_root(root) {
            Ok(dir) if !dir.is_dir() => warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "docs_dir '{}' does not exist yet; it is created on first use",
                    dir.display()
                ),
            }),
            Ok(_) => {}
            Err(e) => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("docs_dir cannot be resolved: {e}"),
            }),
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
