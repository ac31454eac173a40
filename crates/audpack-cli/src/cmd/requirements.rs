//! `audpack requirements` — list the enabled package references.

use anyhow::Result;
use std::path::Path;

use audpack_core::Recipe;
use audpack_schema::Os;

/// Print one package reference per line, in table order.
///
/// With `build`, prints the build-time tool references instead (the ELF
/// patching tool, host-architecture Qt tools when cross-compiling).
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn requirements(config_path: &Path, os: Os, build: bool, cross: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let recipe = Recipe::new();

    let refs = if build {
        recipe.build_requirements(&super::settings(os, None, cross), &config)
    } else {
        recipe.requirements(&config)
    };

    for reference in refs {
        println!("{reference}");
    }

    Ok(())
}
