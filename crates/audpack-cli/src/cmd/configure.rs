//! `audpack configure` — resolve and emit the package option table.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use audpack_core::Recipe;
use audpack_schema::Os;

/// Resolve the option table for the enabled dependencies and emit it as
/// TOML, either to stdout or to `out`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the table
/// cannot be serialized, or the output file cannot be written.
pub fn configure(config_path: &Path, os: Os, cross: bool, out: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let recipe = Recipe::new();

    let table = recipe.configure(&super::settings(os, None, cross), &config);
    let rendered = toml::to_string_pretty(&table).context("Failed to serialize option table")?;

    match out {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
