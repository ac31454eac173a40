//! Generated build-configuration snippets.
//!
//! Descriptors may contribute lines of build-tool configuration that must
//! run before or after dependency discovery (e.g. pointing a cross build
//! at host-architecture Qt tools). The accumulators are explicit values
//! threaded through the generate phase and returned with its report, so
//! the contribution order is exactly the processing order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Name of the snippet file consumed before dependency discovery.
pub const PRE_FILE_NAME: &str = "pre-find-package.cmake";

/// Name of the snippet file consumed after dependency discovery.
pub const POST_FILE_NAME: &str = "post-find-package.cmake";

/// Accumulated pre/post dependency-discovery configuration lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snippets {
    pre: Vec<String>,
    post: Vec<String>,
}

impl Snippets {
    /// Create empty accumulators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line to the pre-discovery snippet.
    pub fn append_pre(&mut self, line: impl Into<String>) {
        self.pre.push(line.into());
    }

    /// Append a line to the post-discovery snippet.
    pub fn append_post(&mut self, line: impl Into<String>) {
        self.post.push(line.into());
    }

    /// The pre-discovery snippet text, if any lines were contributed.
    pub fn pre(&self) -> Option<String> {
        (!self.pre.is_empty()).then(|| self.pre.join("\n"))
    }

    /// The post-discovery snippet text, if any lines were contributed.
    pub fn post(&self) -> Option<String> {
        (!self.post.is_empty()).then(|| self.post.join("\n"))
    }

    /// Write the non-empty snippets into `dir`, returning the paths
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a file
    /// cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (name, content) in [(PRE_FILE_NAME, self.pre()), (POST_FILE_NAME, self.post())] {
            let Some(content) = content else { continue };
            fs::create_dir_all(dir)?;
            let path = dir.join(name);
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);
        }

        Ok(written)
    }
}
