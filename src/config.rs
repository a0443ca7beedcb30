use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root configuration structure, deserialized from `.clause-checkr/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Reasoning backend used with `--online`.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Tunables of the rule-based block extractor.
    #[serde(default)]
    pub extract: ExtractConfig,
    /// Tunables of the rule-based clause verifier.
    #[serde(default)]
    pub verify: VerifyConfig,
}

/// OpenAI-compatible chat-completions endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Minimum score a candidate block needs to be reported.
    pub min_score: f64,
    /// Blocks with more non-blank lines than this are scored at half weight.
    pub max_block_lines: usize,
    /// Bonus for blocks near the top of comment extracts, scaled by position.
    pub header_bonus: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_score: 3.0,
            max_block_lines: 400,
            header_bonus: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Share of a claim's content words that must appear in one license
    /// sentence for the claim to count as supported.
    pub support_ratio: f64,
    /// Lower share at which the claim is treated as open to interpretation.
    pub partial_ratio: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            support_ratio: 0.8,
            partial_ratio: 0.5,
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.clause-checkr/config.toml`
/// 3. `~/.config/clause-checkr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".clause-checkr").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("clause-checkr")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
