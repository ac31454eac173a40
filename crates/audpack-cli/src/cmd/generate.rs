//! `audpack generate` — place built packages' runtime files.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use audpack_core::Recipe;
use audpack_core::context::BuildContext;
use audpack_core::relinker::{NullPatcher, Patchelf, PathPatcher};
use audpack_schema::{BuildType, Os, PackageInfo};

/// Run the placement phase over the built packages described in the
/// `deps_info` JSON file (an array of package records, in build order).
///
/// # Errors
///
/// Returns an error if the configuration or package descriptions cannot
/// be loaded, a record is invalid, or placement fails.
pub fn generate(
    config_path: &Path,
    os: Os,
    build_type: BuildType,
    build_folder: &Path,
    deps_info: &Path,
    cross: bool,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let packages = load_packages(deps_info)?;

    let ctx = BuildContext::new(
        super::settings(os, Some(build_type), cross),
        config,
        build_folder.to_path_buf(),
        packages,
    );

    // Only the ELF family ever patches binaries; elsewhere the external
    // patchelf tool need not exist.
    let patcher: &dyn PathPatcher = match os {
        Os::Linux => &Patchelf,
        Os::Windows | Os::Macos => &NullPatcher,
    };

    let recipe = Recipe::new();
    let report = recipe.generate(&ctx, patcher)?;

    println!("Placed {} package(s)", ctx.packages().len());
    for path in &report.written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Parse and validate the built-package descriptions.
fn load_packages(path: &Path) -> Result<Vec<PackageInfo>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let packages: Vec<PackageInfo> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    for package in &packages {
        package
            .validate()
            .with_context(|| format!("Invalid package record in {}", path.display()))?;
    }

    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_packages_rejects_invalid_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("deps.json");
        fs::write(&path, r#"[{"name": "", "package_folder": "/p"}]"#).unwrap();
        assert!(load_packages(&path).is_err());
    }

    #[test]
    fn test_load_packages_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("deps.json");
        fs::write(
            &path,
            r#"[
                {"name": "zlib", "package_folder": "/pkgs/zlib", "libdirs": ["/pkgs/zlib/lib"]},
                {"name": "qt", "package_folder": "/pkgs/qt"}
            ]"#,
        )
        .unwrap();

        let packages = load_packages(&path).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "zlib");
        assert_eq!(packages[1].name, "qt");
    }
}
