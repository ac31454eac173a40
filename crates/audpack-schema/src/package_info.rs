//! Description of an already-built package, as reported by the package
//! manager after the build phase.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors that can occur when validating a [`PackageInfo`].
#[derive(thiserror::Error, Debug)]
pub enum PackageInfoError {
    /// A required field is empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),
}

/// Output layout of one built package.
///
/// The recipe never builds anything itself; it receives these records from
/// the external package manager and only reads from the directories they
/// name. Directory lists may be empty for header-only packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name as declared in the dependency table (e.g. `"zlib"`).
    pub name: String,

    /// Root of the installed package.
    pub package_folder: PathBuf,

    /// Shared-library output directories, most specific first.
    #[serde(default)]
    pub libdirs: Vec<PathBuf>,

    /// Executable/DLL output directories, most specific first.
    #[serde(default)]
    pub bindirs: Vec<PathBuf>,
}

impl PackageInfo {
    /// Validates that the record names a package and a package root.
    ///
    /// # Errors
    ///
    /// Returns [`PackageInfoError::EmptyField`] if `name` or
    /// `package_folder` is empty.
    pub fn validate(&self) -> Result<(), PackageInfoError> {
        if self.name.is_empty() {
            return Err(PackageInfoError::EmptyField("name"));
        }
        if self.package_folder.as_os_str().is_empty() {
            return Err(PackageInfoError::EmptyField("package_folder"));
        }
        Ok(())
    }

    /// The primary shared-library directory, if the package has one.
    pub fn first_libdir(&self) -> Option<&Path> {
        self.libdirs.first().map(PathBuf::as_path)
    }

    /// The primary executable directory, if the package has one.
    pub fn first_bindir(&self) -> Option<&Path> {
        self.bindirs.first().map(PathBuf::as_path)
    }
}
