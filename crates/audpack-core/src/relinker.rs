//! ELF runtime-search-path patching.
//!
//! Copied shared libraries must locate their siblings relative to their own
//! location, so every library placed on the ELF family gets an `$ORIGIN`
//! based rpath. Patching goes through an external `patchelf` process;
//! debug-info stripping through `strip`.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

/// The dynamic linker's token for "the directory containing this file".
pub const ORIGIN: &str = "$ORIGIN";

/// Package reference of the patchelf tool the build fetches on the ELF
/// family (it is a build-time requirement, not a runtime dependency).
pub const PATCHELF_REFERENCE: &str = "patchelf/0.13@audacity/stable";

/// Binary patching operations needed by the placement step.
///
/// A trait seam so that placement logic can be exercised without invoking
/// real binutils on real ELF files.
pub trait PathPatcher {
    /// Replace the embedded rpath of `file` with `rpath`.
    ///
    /// # Errors
    ///
    /// Returns an error if the patching tool is missing or fails.
    fn set_rpath(&self, file: &Path, rpath: &str) -> Result<()>;

    /// Append `entry` to the embedded rpath of `file`, keeping existing
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the patching tool is missing or fails.
    fn append_rpath(&self, file: &Path, entry: &str) -> Result<()>;

    /// Strip debug information from `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if `strip` is missing or fails.
    fn strip_debug(&self, file: &Path) -> Result<()>;
}

/// Patches rpaths via the external `patchelf` tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Patchelf;

impl Patchelf {
    /// Executes `patchelf` with the given arguments and handles errors.
    fn run_patchelf(args: &[&str], file: &Path) -> Result<std::process::Output> {
        let tool = which::which("patchelf").context(
            "'patchelf' not found. It is fetched as a build requirement on Linux; \
             make sure the build requirements step ran first.",
        )?;

        let output = Command::new(tool)
            .args(args)
            .arg(file)
            .output()
            .context("Failed to spawn patchelf")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("patchelf failed on {}: {}", file.display(), stderr);
        }

        Ok(output)
    }

    /// Reads the current rpath embedded in `file`.
    fn print_rpath(file: &Path) -> Result<String> {
        let output = Self::run_patchelf(&["--print-rpath"], file)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl PathPatcher for Patchelf {
    fn set_rpath(&self, file: &Path, rpath: &str) -> Result<()> {
        Self::run_patchelf(&["--set-rpath", rpath], file)?;
        Ok(())
    }

    fn append_rpath(&self, file: &Path, entry: &str) -> Result<()> {
        let current = Self::print_rpath(file)?;

        if current.split(':').any(|e| e == entry) {
            return Ok(());
        }

        let combined = if current.is_empty() {
            entry.to_string()
        } else {
            format!("{current}:{entry}")
        };

        self.set_rpath(file, &combined)
    }

    fn strip_debug(&self, file: &Path) -> Result<()> {
        let output = Command::new("strip")
            .arg("--strip-debug")
            .arg(file)
            .output()
            .context("Failed to spawn strip")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("strip failed on {}: {}", file.display(), stderr);
        }

        Ok(())
    }
}

/// A no-op patcher for platforms where no patching is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPatcher;

impl PathPatcher for NullPatcher {
    fn set_rpath(&self, _: &Path, _: &str) -> Result<()> {
        Ok(())
    }
    fn append_rpath(&self, _: &Path, _: &str) -> Result<()> {
        Ok(())
    }
    fn strip_debug(&self, _: &Path) -> Result<()> {
        Ok(())
    }
}

/// A single operation observed by a [`RecordingPatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchEvent {
    /// `set_rpath(file, rpath)` was requested.
    SetRpath {
        /// File that would have been patched.
        file: std::path::PathBuf,
        /// Requested rpath value.
        rpath: String,
    },
    /// `append_rpath(file, entry)` was requested.
    AppendRpath {
        /// File that would have been patched.
        file: std::path::PathBuf,
        /// Entry that would have been appended.
        entry: String,
    },
    /// `strip_debug(file)` was requested.
    StripDebug {
        /// File that would have been stripped.
        file: std::path::PathBuf,
    },
}

/// Records patch operations instead of performing them (dry runs, tests).
#[derive(Debug, Default)]
pub struct RecordingPatcher {
    events: Mutex<Vec<PatchEvent>>,
}

impl RecordingPatcher {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The operations recorded so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn events(&self) -> Vec<PatchEvent> {
        self.events.lock().expect("patcher lock poisoned").clone()
    }
}

impl PathPatcher for RecordingPatcher {
    fn set_rpath(&self, file: &Path, rpath: &str) -> Result<()> {
        self.events
            .lock()
            .expect("patcher lock poisoned")
            .push(PatchEvent::SetRpath {
                file: file.to_path_buf(),
                rpath: rpath.to_string(),
            });
        Ok(())
    }

    fn append_rpath(&self, file: &Path, entry: &str) -> Result<()> {
        self.events
            .lock()
            .expect("patcher lock poisoned")
            .push(PatchEvent::AppendRpath {
                file: file.to_path_buf(),
                entry: entry.to_string(),
            });
        Ok(())
    }

    fn strip_debug(&self, file: &Path) -> Result<()> {
        self.events
            .lock()
            .expect("patcher lock poisoned")
            .push(PatchEvent::StripDebug {
                file: file.to_path_buf(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_recording_patcher_keeps_order() {
        let patcher = RecordingPatcher::new();
        let lib = PathBuf::from("/out/lib/libfoo.so.1");

        patcher.set_rpath(&lib, ORIGIN).unwrap();
        patcher.strip_debug(&lib).unwrap();

        assert_eq!(
            patcher.events(),
            vec![
                PatchEvent::SetRpath {
                    file: lib.clone(),
                    rpath: ORIGIN.to_string()
                },
                PatchEvent::StripDebug { file: lib },
            ]
        );
    }
}
