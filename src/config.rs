//! Configuration management for mender
//!
//! Stores settings in ~/.config/mender/config.json. Environment variables
//! take precedence over the file: OPENROUTER_API_KEY for the key,
//! MENDER_MODEL for the default model.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Model used when neither the CLI, the environment, nor the config file
/// names one.
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4.5";

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Seconds before an in-flight model request is abandoned. A hung call
/// would otherwise stall the whole session.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mender"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        preserve_corrupt_config(&path, &content);
                        eprintln!(
                            "  Warning: Config file was corrupted ({err}). A backup was saved and defaults were loaded."
                        );
                    }
                }
            }
        }
        Self::default()
    }

    /// API key, environment variable first.
    pub fn api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.api_key.clone()
    }

    /// Resolve the model identifier: CLI flag, then MENDER_MODEL, then the
    /// config file, then the built-in default.
    pub fn model(&self, cli_override: Option<&str>) -> String {
        if let Some(model) = cli_override {
            return model.to_string();
        }
        if let Ok(model) = std::env::var("MENDER_MODEL") {
            if !model.is_empty() {
                return model;
            }
        }
        self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/mender/config.json".to_string())
    }
}

fn preserve_corrupt_config(path: &std::path::Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
