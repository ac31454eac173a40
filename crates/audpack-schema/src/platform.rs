//! Platform and build-type settings handed down by the build orchestrator.

use serde::{Deserialize, Serialize};

/// Error returned when a platform or build-type string cannot be parsed.
#[derive(thiserror::Error, Debug)]
#[error("Unknown {kind}: {value}")]
pub struct PlatformParseError {
    /// What was being parsed (`"os"` or `"build type"`).
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// Operating-system family of the build target.
///
/// The recipe only ever branches three ways: the DLL convention, the dylib
/// bundle convention, and everything else. [`Os::Linux`] therefore stands
/// for the whole ELF family, not just Linux proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Windows (`.dll` convention, binaries next to the executable).
    Windows,
    /// macOS (`.dylib` convention, libraries inside the app bundle).
    Macos,
    /// Linux and the remaining ELF platforms (`.so` convention, rpath).
    Linux,
}

impl Os {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win32" | "win64" => Ok(Self::Windows),
            "macos" | "darwin" | "osx" => Ok(Self::Macos),
            "linux" | "freebsd" | "unix" => Ok(Self::Linux),
            _ => Err(PlatformParseError {
                kind: "os",
                value: s.to_string(),
            }),
        }
    }
}

/// CMake-style build configuration of the consuming application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
    /// Unoptimized build with debug info.
    Debug,
    /// Optimized build.
    Release,
    /// Optimized build that keeps debug info; the only configuration for
    /// which the generated find-package snippets are written.
    RelWithDebInfo,
    /// Size-optimized build.
    MinSizeRel,
}

impl BuildType {
    /// The CMake spelling, also used as an output subdirectory on Windows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BuildType {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            "relwithdebinfo" => Ok(Self::RelWithDebInfo),
            "minsizerel" => Ok(Self::MinSizeRel),
            _ => Err(PlatformParseError {
                kind: "build type",
                value: s.to_string(),
            }),
        }
    }
}
