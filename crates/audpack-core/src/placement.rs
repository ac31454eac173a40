//! Generic platform-dispatched file placement.
//!
//! Given a built package, exactly one of three branches runs:
//!
//! - Windows: `*.dll` from the package's bin directory into the build root.
//! - macOS: `*.dylib*` from the lib directory into the app bundle's
//!   `Frameworks` folder.
//! - ELF family: `*.so*` from the lib directory into the library directory,
//!   then every copied file gets an `$ORIGIN` rpath so it can find sibling
//!   libraries next to itself.
//!
//! A package with no directory in the relevant category is skipped
//! silently; that is not an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use audpack_schema::{Os, PackageInfo};

use crate::context::BuildContext;
use crate::relinker::{ORIGIN, PathPatcher};

/// Best-effort policy for auxiliary fixups: a failure is logged and
/// swallowed so the remaining fixups can proceed.
///
/// Placement of a package's own files never goes through this; only the
/// extra "copy libraries the package forgot to declare" steps do.
pub fn continue_on_failure(what: &str, result: Result<()>) {
    if let Err(err) = result {
        warn!("Ignoring failure while {what}: {err:#}");
    }
}

/// Copy every file under `src` whose filename matches `pattern` into `dst`.
///
/// Relative paths below `src` are preserved unless `flatten` is set, in
/// which case everything lands directly in `dst`. A missing or empty
/// source directory copies nothing. Returns the destination paths of the
/// copied files.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a copy fails.
pub fn copy_matching(
    src: &Path,
    pattern: &str,
    dst: &Path,
    flatten: bool,
) -> Result<Vec<PathBuf>> {
    if !src.is_dir() {
        return Ok(Vec::new());
    }

    let matcher = glob::Pattern::new(pattern)
        .with_context(|| format!("Invalid file pattern: {pattern}"))?;

    let mut copied = Vec::new();

    for entry in walkdir::WalkDir::new(src)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !matcher.matches(file_name) {
            continue;
        }

        let target = if flatten {
            dst.join(file_name)
        } else {
            // path is under src by construction
            dst.join(path.strip_prefix(src)?)
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::copy(path, &target)
            .with_context(|| format!("Failed to copy {} to {}", path.display(), target.display()))?;
        debug!("Copied {} -> {}", path.display(), target.display());
        copied.push(target);
    }

    Ok(copied)
}

/// Copy shared objects from `src` to `dst` and, when `set_origin` is set,
/// give each copied file a self-relative `$ORIGIN` rpath.
///
/// # Errors
///
/// Returns an error if copying or rpath patching fails.
pub fn safe_linux_copy(
    src: &Path,
    dst: &Path,
    patcher: &dyn PathPatcher,
    set_origin: bool,
) -> Result<Vec<PathBuf>> {
    let copied = copy_matching(src, "*.so*", dst, false)?;

    if set_origin {
        for file in &copied {
            patcher.set_rpath(file, ORIGIN)?;
        }
    }

    Ok(copied)
}

/// The generic three-way placement for one built package.
///
/// # Errors
///
/// Returns an error if a copy or (on the ELF family) rpath patch fails.
pub fn copy_runtime_files(
    ctx: &BuildContext,
    info: &PackageInfo,
    patcher: &dyn PathPatcher,
) -> Result<()> {
    match ctx.settings.os {
        Os::Windows => {
            let Some(bindir) = info.first_bindir() else {
                return Ok(());
            };
            copy_matching(bindir, "*.dll", &ctx.build_folder, false)?;
        }
        Os::Macos => {
            let Some(libdir) = info.first_libdir() else {
                return Ok(());
            };
            copy_matching(libdir, "*.dylib*", &ctx.bundle_dir("Frameworks"), false)?;
        }
        Os::Linux => {
            let Some(libdir) = info.first_libdir() else {
                return Ok(());
            };
            let target = ctx.linux_libdir();
            info!(
                "Copying files from {} to {}",
                libdir.display(),
                target.display()
            );
            safe_linux_copy(libdir, &target, patcher, true)?;
        }
    }

    Ok(())
}

/// Path of `to` relative to `from`, both assumed absolute and normalized
/// (the placement step only ever produces such paths). Shared prefixes are
/// dropped and the remainder of `from` becomes `..` components.
pub fn relative_path_from(from: &Path, to: &Path) -> PathBuf {
    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part);
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecipeConfig;
    use crate::context::BuildSettings;
    use crate::relinker::{PatchEvent, RecordingPatcher};
    use audpack_schema::BuildType;

    fn write_file(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"fake").unwrap();
    }

    fn built_package(root: &Path) -> PackageInfo {
        let libdir = root.join("pkg/lib");
        let bindir = root.join("pkg/bin");
        write_file(&libdir.join("libz.so.1"));
        write_file(&libdir.join("libz.dylib"));
        write_file(&bindir.join("zlib1.dll"));
        PackageInfo {
            name: "zlib".to_string(),
            package_folder: root.join("pkg"),
            libdirs: vec![libdir],
            bindirs: vec![bindir],
        }
    }

    fn ctx_for(os: Os, build_folder: PathBuf) -> BuildContext {
        BuildContext::new(
            BuildSettings {
                os,
                build_type: BuildType::Release,
                cross_compiling: false,
            },
            RecipeConfig::default(),
            build_folder,
            vec![],
        )
    }

    #[test]
    fn test_windows_branch_copies_dlls_to_build_root() {
        let tmp = tempfile::tempdir().unwrap();
        let info = built_package(tmp.path());
        let build = tmp.path().join("build");
        let ctx = ctx_for(Os::Windows, build.clone());
        let patcher = RecordingPatcher::new();

        copy_runtime_files(&ctx, &info, &patcher).unwrap();

        assert!(build.join("zlib1.dll").exists());
        // No library files land anywhere, and nothing is patched.
        assert!(!build.join("lib").exists());
        assert!(!build.join("Audacity.app").exists());
        assert!(patcher.events().is_empty());
    }

    #[test]
    fn test_macos_branch_copies_dylibs_into_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let info = built_package(tmp.path());
        let build = tmp.path().join("build");
        let ctx = ctx_for(Os::Macos, build.clone());
        let patcher = RecordingPatcher::new();

        copy_runtime_files(&ctx, &info, &patcher).unwrap();

        let frameworks = build.join("Audacity.app/Contents/Frameworks");
        assert!(frameworks.join("libz.dylib").exists());
        assert!(!build.join("zlib1.dll").exists());
        assert!(!build.join("lib").exists());
        assert!(patcher.events().is_empty());
    }

    #[test]
    fn test_linux_branch_copies_and_sets_origin_rpath() {
        let tmp = tempfile::tempdir().unwrap();
        let info = built_package(tmp.path());
        let build = tmp.path().join("build");
        let ctx = ctx_for(Os::Linux, build.clone());
        let patcher = RecordingPatcher::new();

        copy_runtime_files(&ctx, &info, &patcher).unwrap();

        let copied = build.join("lib/libz.so.1");
        assert!(copied.exists());
        assert!(!build.join("zlib1.dll").exists());
        assert_eq!(
            patcher.events(),
            vec![PatchEvent::SetRpath {
                file: copied,
                rpath: ORIGIN.to_string()
            }]
        );
    }

    #[test]
    fn test_missing_source_directory_is_a_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let info = PackageInfo {
            name: "headeronly".to_string(),
            package_folder: tmp.path().join("pkg"),
            libdirs: vec![],
            bindirs: vec![],
        };
        let build = tmp.path().join("build");
        for os in [Os::Windows, Os::Macos, Os::Linux] {
            let ctx = ctx_for(os, build.clone());
            copy_runtime_files(&ctx, &info, &RecordingPatcher::new()).unwrap();
        }
        assert!(!build.exists());
    }

    #[test]
    fn test_copy_matching_flatten() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        write_file(&src.join("nested/dir/wxbase.dll"));
        write_file(&src.join("readme.txt"));
        let dst = tmp.path().join("dst");

        let copied = copy_matching(&src, "*.dll", &dst, true).unwrap();

        assert_eq!(copied, vec![dst.join("wxbase.dll")]);
        assert!(dst.join("wxbase.dll").exists());
        assert!(!dst.join("nested").exists());
        assert!(!dst.join("readme.txt").exists());
    }

    #[test]
    fn test_copy_matching_preserves_structure() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        write_file(&src.join("plugins/platforms/libqxcb.so"));
        let dst = tmp.path().join("dst");

        copy_matching(&src, "*.so", &dst, false).unwrap();

        assert!(dst.join("plugins/platforms/libqxcb.so").exists());
    }

    #[test]
    fn test_relative_path_from() {
        assert_eq!(
            relative_path_from(
                Path::new("/build/lib/qt6/plugins/platforms"),
                Path::new("/build/lib")
            ),
            PathBuf::from("../../..")
        );
        assert_eq!(
            relative_path_from(Path::new("/build/lib"), Path::new("/build/lib")),
            PathBuf::new()
        );
    }

    #[test]
    fn test_continue_on_failure_swallows_errors() {
        continue_on_failure("copying aux lib", Err(anyhow::anyhow!("boom")));
        continue_on_failure("copying aux lib", Ok(()));
    }
}
