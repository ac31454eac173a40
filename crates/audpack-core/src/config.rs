//! Recipe configuration parsing
//!
//! The invoking build exposes one boolean switch per dependency
//! (`use_<name>`) plus a handful of free-standing options. They arrive in
//! an `audpack.toml` file:
//!
//! ```toml
//! [options]
//! use_zlib = true
//! use_qt = true
//! use_jack = false
//! lib_dir = "lib64"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or parsing a recipe configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a valid config.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level structure of `audpack.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeConfig {
    /// The `[options]` table of switches.
    #[serde(default)]
    pub options: Options,
}

/// The `[options]` table: named switches plus the per-dependency
/// `use_<name>` toggles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    /// Enable the low-latency ASIO host API in the audio I/O library
    /// (Windows only).
    #[serde(default)]
    pub use_asio: bool,

    /// Enable the JACK audio-routing backend in the audio I/O library
    /// (non-macOS platforms).
    #[serde(default)]
    pub use_jack: bool,

    /// Override the Linux library directory name (defaults to `lib`).
    #[serde(default)]
    pub lib_dir: Option<String>,

    /// Per-dependency `use_<name>` switches. Absent switches fall back to
    /// the descriptor's `default_enabled` flag.
    #[serde(flatten)]
    pub switches: BTreeMap<String, bool>,
}

impl RecipeConfig {
    /// Parse a recipe configuration from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, or
    /// `ConfigError::Parse` if the TOML content is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a recipe configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the TOML content is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration, treating a missing file the same as an empty
    /// one so first runs behave like subsequent ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// The explicit `use_<name>` switch for a dependency, if configured.
    pub fn switch(&self, name: &str) -> Option<bool> {
        self.options.switches.get(&format!("use_{name}")).copied()
    }

    /// Whether a dependency is enabled, falling back to its
    /// `default_enabled` flag when no explicit switch is configured.
    pub fn enabled_for(&self, name: &str, default_enabled: bool) -> bool {
        self.switch(name).unwrap_or(default_enabled)
    }

    /// Whether the ASIO host API is requested.
    pub fn use_asio(&self) -> bool {
        self.options.use_asio
    }

    /// Whether the JACK backend is requested.
    pub fn use_jack(&self) -> bool {
        self.options.use_jack
    }

    /// The Linux library directory name (`lib` unless overridden).
    pub fn lib_dir(&self) -> &str {
        self.options.lib_dir.as_deref().unwrap_or("lib")
    }
}
