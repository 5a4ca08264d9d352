use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::engine::Stage;

const CONFIG_DIR: &str = "manifest-remediator";

/// Root configuration structure, deserialized from `.manifest-remediator/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Policy engine connection.
    #[serde(default)]
    pub engine: EngineConfig,
    /// How remediation lookups are scheduled.
    #[serde(default)]
    pub remediation: RemediationConfig,
}

/// Where and as whom the policy engine is queried.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the engine, e.g. `http://localhost:8070`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Public id of the application whose policies apply.
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub stage: Stage,
    /// Upper bound for each engine call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemediationConfig {
    /// Number of components evaluated concurrently.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin123".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    8
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            url: None,
            username: default_username(),
            password: default_password(),
            application: None,
            stage: Stage::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        RemediationConfig {
            batch_size: default_batch_size(),
        }
    }
}

impl EngineConfig {
    /// The application id, failing when the settings cannot reach an engine.
    pub fn require_application(&self) -> Result<&str> {
        if self.url.as_deref().map_or(true, str::is_empty) {
            bail!("no policy engine URL configured (set [engine].url or pass --iq-url)");
        }
        match self.application.as_deref() {
            Some(app) if !app.is_empty() => Ok(app),
            _ => bail!("no application configured (set [engine].application or pass --iq-app)"),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, the path passed via `--config`
/// 2. `<project_path>/.manifest-remediator/config.toml`
/// 3. `~/.config/manifest-remediator/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path
        .join(format!(".{}", CONFIG_DIR))
        .join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join(CONFIG_DIR).join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}
