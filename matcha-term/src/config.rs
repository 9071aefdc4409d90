//! Configuration
//!
//! Loaded from a TOML file when one exists; every field has a sensible
//! default so the terminal also runs with no configuration at all.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Terminal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Initial dimensions in cells
    #[serde(default = "default_cols")]
    pub cols: usize,
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Command to run instead of the user's shell
    #[serde(default)]
    pub shell: Option<Vec<String>>,
    /// Value exported as $TERM
    #[serde(default = "default_term")]
    pub term: String,
    /// Whether applications may switch to the alternate screen
    #[serde(default = "default_true")]
    pub allow_alt_screen: bool,
    /// Characters that delimit words for snap-to-word selection
    #[serde(default = "default_word_delimiters")]
    pub word_delimiters: String,
}

fn default_cols() -> usize {
    80
}

fn default_rows() -> usize {
    24
}

fn default_term() -> String {
    "xterm-256color".to_string()
}

fn default_true() -> bool {
    true
}

fn default_word_delimiters() -> String {
    " ".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            shell: None,
            term: default_term(),
            allow_alt_screen: true,
            word_delimiters: default_word_delimiters(),
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// The XDG config location: `$XDG_CONFIG_HOME/matcha/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("matcha").join("config.toml"))
    }

    /// Load the default config file when present, defaults otherwise
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path).unwrap_or_else(|e| {
                log::warn!("using default configuration: {}", e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }
}
