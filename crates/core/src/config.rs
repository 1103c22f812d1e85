use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tagging: TagRules,
    pub intake: IntakeConfig,
    pub upload: UploadConfig,
}

/// Thresholds used by the tag deriver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagRules {
    /// Filename tokens shorter than this are dropped.
    pub min_token_len: usize,
    /// Lower bound (MB) of `medium-file`.
    pub medium_file_mb: f64,
    /// Lower bound (MB) of `large-file`.
    pub large_file_mb: f64,
    /// Either side at or above this many pixels yields `high-resolution`.
    pub high_res_px: u32,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            min_token_len: 3,
            medium_file_mb: 1.0,
            large_file_mb: 5.0,
            high_res_px: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub exclude: Vec<String>,
    pub include_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub api_base: String,
    pub repo: Option<String>,
    pub branch: String,
    pub path_prefix: String,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            repo: None,
            branch: "main".to_string(),
            path_prefix: "images".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("TAGGER")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build().context("reading configuration")?;
    cfg.try_deserialize().context("invalid configuration")
}
