//! Configuration
//!
//! Two layers: [`RunConfig`], the immutable per-run settings handed to the
//! agent loop, and [`FileConfig`], the TOML credential/model file with an
//! environment-variable override.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Model used when neither the CLI nor the config file names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Model round-trip budget used when the CLI does not override it.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Environment variable consulted before the config file.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// Per-run configuration
// ---------------------------------------------------------------------------

/// Settings for one agent run. Created once per invocation and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Sandbox root. Absolute, resolved before the run starts.
    pub root: PathBuf,
    /// Model identifier.
    pub model: String,
    /// Maximum model round-trips per run.
    pub max_steps: usize,
    /// Raise log verbosity.
    pub verbose: bool,
    /// Report writes without touching the filesystem.
    pub dry_run: bool,
    /// Permit the `run_file` operation.
    pub allow_run: bool,
    /// Skip the diff preview when overwriting an existing file.
    pub auto_apply: bool,
}

impl RunConfig {
    /// Defaults for a run rooted at `root`: default model, ten steps,
    /// every gate closed.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            model: DEFAULT_MODEL.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            verbose: false,
            dry_run: false,
            allow_run: false,
            auto_apply: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Credential / model file
// ---------------------------------------------------------------------------

/// On-disk configuration (`~/.config/skiff/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// API key. The `GEMINI_API_KEY` environment variable takes precedence.
    pub api_key: Option<String>,
    /// Default model override.
    pub model: Option<String>,
}

impl FileConfig {
    /// Load from the default location; a missing file yields defaults.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            info!("no config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        Ok(dir.join("skiff").join("config.toml"))
    }

    /// Resolve the API key: environment variable first, config file second.
    pub fn resolve_api_key(&self) -> Option<String> {
        Self::resolve_with_env(std::env::var(API_KEY_ENV).ok(), self)
    }

    fn resolve_with_env(env_key: Option<String>, config: &Self) -> Option<String> {
        env_key
            .filter(|k| !k.is_empty())
            .or_else(|| config.api_key.clone().filter(|k| !k.is_empty()))
    }

    /// Resolve the API key or fail with setup instructions.
    pub fn require_api_key(&self) -> Result<String> {
        match self.resolve_api_key() {
            Some(key) => Ok(key),
            None => {
                let path = Self::default_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string());
                bail!(
                    "no API key configured: set the {API_KEY_ENV} environment variable \
                     or add api_key to {path}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
