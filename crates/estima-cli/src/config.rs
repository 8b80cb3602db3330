//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$ESTIMA_CONFIG` environment variable
//! 2. `~/.config/estima/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use estima_explain::GeminiSettings;
use estima_render::{ConfigPaths, RendererSettings};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub renderer: RendererSettings,
    pub render_config: RenderConfigFiles,
    pub explain: ExplainConfig,
    pub session: SessionConfig,
}

/// Render-config file locations, relative to the renderer workdir.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfigFiles {
    pub mle_path: PathBuf,
    pub regression_path: PathBuf,
}

/// Text-generation settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub endpoint: String,
    pub model: String,
    /// Takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    pub api_key_env: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file. Default: platform-specific data dir.
    pub path: Option<PathBuf>,
}

// --- Defaults ---

impl Default for RenderConfigFiles {
    fn default() -> Self {
        let paths = ConfigPaths::default();
        Self {
            mle_path: paths.mle,
            regression_path: paths.regression,
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        let gemini = GeminiSettings::default();
        Self {
            endpoint: gemini.endpoint,
            model: gemini.model,
            api_key: None,
            api_key_env: "GEMINI_API_KEY".into(),
        }
    }
}

impl Config {
    /// Config file paths resolved against the renderer workdir.
    pub fn config_paths(&self) -> ConfigPaths {
        ConfigPaths {
            mle: self.renderer.workdir.join(&self.render_config.mle_path),
            regression: self.renderer.workdir.join(&self.render_config.regression_path),
        }
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            endpoint: self.explain.endpoint.clone(),
            model: self.explain.model.clone(),
        }
    }

    /// API key from the config file, then from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        let present = |k: &String| !k.trim().is_empty();
        self.explain
            .api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(&self.explain.api_key_env).ok().filter(present))
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    let path = config_path();

    if let Some(p) = &path {
        if p.exists() {
            let content =
                std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(config);
        }
    }

    Ok(Config::default())
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("ESTIMA_CONFIG") {
        return Some(PathBuf::from(p));
    }

    dirs_home().map(|home| home.join(".config").join("estima").join("config.toml"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Show the active config path (for `estima config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
