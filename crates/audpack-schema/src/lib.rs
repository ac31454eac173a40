//! Shared types for the audpack dependency-packaging recipe.
//!
//! This crate defines the wire-level vocabulary exchanged between the
//! invoking build orchestrator and the packaging core: platform settings,
//! package option values, and the description of an already-built package.

pub mod options;
pub mod package_info;
pub mod platform;

pub use options::{OptionBag, OptionTable, OptionValue};
pub use package_info::{PackageInfo, PackageInfoError};
pub use platform::{BuildType, Os, PlatformParseError};

/// Default distribution channel for packages that do not declare one.
pub const DEFAULT_CHANNEL: &str = "audacity/stable";
