//! Subcommand implementations, one module per lifecycle phase.

pub mod configure;
pub mod generate;
pub mod requirements;

use anyhow::{Context, Result};
use std::path::Path;

use audpack_core::RecipeConfig;
use audpack_core::context::BuildSettings;
use audpack_schema::{BuildType, Os};

/// Load the recipe configuration, treating a missing file as defaults.
pub(crate) fn load_config(path: &Path) -> Result<RecipeConfig> {
    RecipeConfig::load_or_default(path)
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Assemble build settings from command-line flags.
///
/// The requirements and configure phases never branch on the build type,
/// so it defaults to `Release` there.
pub(crate) fn settings(os: Os, build_type: Option<BuildType>, cross: bool) -> BuildSettings {
    BuildSettings {
        os,
        build_type: build_type.unwrap_or(BuildType::Release),
        cross_compiling: cross,
    }
}
