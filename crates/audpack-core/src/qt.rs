//! The Qt framework specialization.
//!
//! Qt is the one dependency whose packaging goes well beyond "copy the
//! shared libraries": it needs ~15 forced feature options, a handful of
//! small runtime libraries it uses but does not declare, its plugin tree
//! deployed (with rpaths and debug info fixed up) on the ELF family, a
//! cross-build hint for host-architecture tools, and a generated
//! `qt.conf` telling the relocated installation where its plugins,
//! QML imports, and translations live.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use audpack_schema::{Os, OptionTable, PackageInfo};

use crate::context::{BuildContext, BuildSettings};
use crate::placement::{
    continue_on_failure, copy_matching, copy_runtime_files, relative_path_from, safe_linux_copy,
};
use crate::relinker::{ORIGIN, PathPatcher};
use crate::snippets::Snippets;

/// Packaged Qt version.
pub const QT_VERSION: &str = "6.3.1";

/// Distribution channel of the Qt package.
pub const QT_CHANNEL: &str = "audacity/testing";

/// Host-architecture Qt tools, required when cross-compiling.
pub const QT_TOOLS_REFERENCE: &str = "qt-tools/6.3.1@audacity/testing";

/// Qt submodules Audacity needs; everything else stays off.
const ENABLED_MODULES: &[&str] = &[
    "qtsvg",
    "qtdeclarative",
    "qttools",
    "qttranslations",
    "qtquicktimeline",
    "qtlottie",
    "qtimageformats",
    "qtlanguageserver",
    "qtshadertools",
];

/// Runtime libraries Qt's tooling links against but does not declare as
/// direct dependencies. They are copied into Qt's own package folder so
/// the tools remain runnable.
const AUX_RUNTIME_DEPS: &[&str] = &["pcre2", "zlib", "double-conversion"];

/// Write the Qt option set into the table.
///
/// Besides Qt's own entries this touches one foreign package: on
/// non-Linux platforms harfbuzz must not pull in glib.
pub fn apply_options(settings: &BuildSettings, table: &mut OptionTable) {
    let bag = table.package("qt");
    bag.set("opengl", "no");
    bag.set("openssl", false);
    bag.set("with_libjpeg", "libjpeg-turbo");
    bag.set("with_sqlite3", false);
    bag.set("with_pq", false);
    bag.set("with_odbc", false);
    bag.set("with_brotli", false);
    bag.set("with_md4c", false);

    for module in ENABLED_MODULES {
        debug!("\tEnabling Qt module: {module}");
        bag.set(module, true);
    }

    if settings.os == Os::Linux {
        bag.set("qtwayland", false);
    } else {
        table.package("harfbuzz").set("with_glib", false);
    }
}

/// Full Qt placement: fixups, generic copy, then `qt.conf`.
///
/// # Errors
///
/// Returns an error if the plugin deployment, the generic copy, or the
/// `qt.conf` write fails. Auxiliary-library fixups are best-effort and
/// only log their failures.
pub fn copy_files(
    ctx: &BuildContext,
    info: &PackageInfo,
    snippets: &mut Snippets,
    patcher: &dyn PathPatcher,
) -> Result<()> {
    fix_windows_package(ctx, info);
    fix_macos_package(ctx, info);
    fix_linux_package(ctx, info, patcher)?;
    fix_crossbuild(ctx, snippets)?;

    copy_runtime_files(ctx, info, patcher)?;

    write_qt_conf(ctx, info)
}

/// The shared Qt DLLs leave the tooling in the package folder unusable;
/// the tools' runtime dependencies are copied next to them.
fn fix_windows_package(ctx: &BuildContext, info: &PackageInfo) {
    if ctx.settings.os != Os::Windows {
        return;
    }
    let Some(qt_bindir) = info.first_bindir() else {
        return;
    };

    info!("Fixing Qt tooling on Windows...");
    for &dep in AUX_RUNTIME_DEPS {
        continue_on_failure(
            &format!("copying {dep} into the Qt package folder"),
            copy_aux_dep(ctx, dep, |p| {
                copy_matching(p, "*.dll", qt_bindir, false).map(|_| ())
            }),
        );
    }
}

fn fix_macos_package(ctx: &BuildContext, info: &PackageInfo) {
    if ctx.settings.os != Os::Macos {
        return;
    }
    let Some(qt_libdir) = info.first_libdir() else {
        return;
    };

    for &dep in AUX_RUNTIME_DEPS {
        continue_on_failure(
            &format!("copying {dep} into the Qt package folder"),
            copy_aux_dep_lib(ctx, dep, |p| {
                copy_matching(p, "*.dylib*", qt_libdir, false).map(|_| ())
            }),
        );
    }
}

/// Besides the auxiliary libraries (ICU included here, for its data
/// library), the whole plugin tree under `res/archdatadir` is deployed to
/// `<libdir>/qt6`, and every plugin gets an rpath that reaches both its
/// own directory and the main library directory, plus a debug strip.
fn fix_linux_package(ctx: &BuildContext, info: &PackageInfo, patcher: &dyn PathPatcher) -> Result<()> {
    if ctx.settings.os != Os::Linux {
        return Ok(());
    }

    if let Some(qt_libdir) = info.first_libdir() {
        for dep in AUX_RUNTIME_DEPS.iter().copied().chain(std::iter::once("icu")) {
            continue_on_failure(
                &format!("copying {dep} into the Qt package folder"),
                copy_aux_dep_lib(ctx, dep, |p| {
                    safe_linux_copy(p, qt_libdir, patcher, false).map(|_| ())
                }),
            );
        }
    }

    let plugins_source = info.package_folder.join("res").join("archdatadir");
    if !plugins_source.is_dir() {
        return Ok(());
    }

    let libdir = ctx.linux_libdir();
    let plugins_target = libdir.join("qt6");
    fs::create_dir_all(&plugins_target)?;

    let mut opts = fs_extra::dir::CopyOptions::new();
    opts.overwrite = true;
    opts.content_only = true;
    fs_extra::dir::copy(&plugins_source, &plugins_target, &opts).with_context(|| {
        format!(
            "Failed to deploy Qt plugins from {} to {}",
            plugins_source.display(),
            plugins_target.display()
        )
    })?;

    for entry in walkdir::WalkDir::new(&plugins_target)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "so") {
            continue;
        }

        debug!("Setting RPATH of {}", path.display());
        let parent = path.parent().unwrap_or(&plugins_target);
        let to_libdir = relative_path_from(parent, &libdir);
        let rpath = format!("{ORIGIN}:{ORIGIN}/{}", to_libdir.display());
        patcher.set_rpath(path, &rpath)?;
        patcher.strip_debug(path)?;
    }

    Ok(())
}

/// Cross builds need the host-architecture Qt tools; the hint is appended
/// to the pre-discovery snippet.
fn fix_crossbuild(ctx: &BuildContext, snippets: &mut Snippets) -> Result<()> {
    if !ctx.settings.cross_compiling {
        return Ok(());
    }

    let host_tools = ctx
        .package("qt-tools")
        .context("Cross-compiling but the qt-tools package was not built")?;

    snippets.append_pre(format!(
        "set(QT_HOST_PATH \"{}\" CACHE STRING \"Path to the Qt host tools\" FORCE)",
        normalized(&host_tools.package_folder)
    ));

    Ok(())
}

fn copy_aux_dep(
    ctx: &BuildContext,
    dep: &str,
    copy: impl FnOnce(&std::path::Path) -> Result<()>,
) -> Result<()> {
    let package = ctx
        .package(dep)
        .with_context(|| format!("{dep} was not built"))?;
    let bindir = package
        .first_bindir()
        .with_context(|| format!("{dep} has no bin directory"))?;
    info!("Copying {dep} into the Qt package folder");
    copy(bindir)
}

fn copy_aux_dep_lib(
    ctx: &BuildContext,
    dep: &str,
    copy: impl FnOnce(&std::path::Path) -> Result<()>,
) -> Result<()> {
    let package = ctx
        .package(dep)
        .with_context(|| format!("{dep} was not built"))?;
    let libdir = package
        .first_libdir()
        .with_context(|| format!("{dep} has no lib directory"))?;
    info!("Copying {dep} into the Qt package folder");
    copy(libdir)
}

/// Where `qt.conf` lives: next to the executable on Windows, in the
/// bundle's `Resources` on macOS, in `bin/` on the ELF family.
fn qt_conf_dir(ctx: &BuildContext) -> PathBuf {
    match ctx.settings.os {
        Os::Windows => ctx.build_folder.clone(),
        Os::Macos => ctx.bundle_dir("Resources"),
        Os::Linux => ctx.build_folder.join("bin"),
    }
}

fn normalized(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// The `HostPrefix` value: the package itself, unless cross-compiling, in
/// which case the host-architecture tools package.
fn host_prefix(ctx: &BuildContext, info: &PackageInfo) -> Result<String> {
    if !ctx.settings.cross_compiling {
        return Ok(normalized(&info.package_folder));
    }
    let host_tools = ctx
        .package("qt-tools")
        .context("Cross-compiling but the qt-tools package was not built")?;
    Ok(normalized(&host_tools.package_folder))
}

/// The `[Paths]` body of `qt.conf` for the current platform.
fn qt_conf_content(ctx: &BuildContext, info: &PackageInfo) -> Result<String> {
    let prefix = normalized(&info.package_folder);
    let host_prefix = host_prefix(ctx, info)?;

    let content = match ctx.settings.os {
        Os::Windows | Os::Macos => format!(
            "[Paths]\n\
             Prefix = {prefix}\n\
             Plugins = res/archdatadir/plugins\n\
             Qml2Imports = res/archdatadir/qml\n\
             Translations = res/datadir/translations\n\
             Documentation = res/datadir/doc\n\
             HostPrefix = {host_prefix}"
        ),
        Os::Linux => {
            let libdir = ctx.linux_libdir_name();
            format!(
                "[Paths]\n\
                 Prefix = {prefix}\n\
                 Plugins = ../{libdir}/qt6/plugins\n\
                 Qml2Imports = ../{libdir}/qt6/qml\n\
                 HostPrefix = {host_prefix}"
            )
        }
    };

    Ok(content)
}

/// Generate `qt.conf` in the platform's configuration directory.
fn write_qt_conf(ctx: &BuildContext, info: &PackageInfo) -> Result<()> {
    let dir = qt_conf_dir(ctx);
    fs::create_dir_all(&dir)?;

    let path = dir.join("qt.conf");
    fs::write(&path, qt_conf_content(ctx, info)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecipeConfig;
    use crate::context::BuildSettings;
    use crate::relinker::{PatchEvent, RecordingPatcher};
    use audpack_schema::{BuildType, OptionValue};
    use std::path::Path;

    fn settings(os: Os) -> BuildSettings {
        BuildSettings {
            os,
            build_type: BuildType::RelWithDebInfo,
            cross_compiling: false,
        }
    }

    fn write_file(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"fake").unwrap();
    }

    fn qt_package(root: &Path) -> PackageInfo {
        let pkg = root.join("pkgs/qt");
        write_file(&pkg.join("lib/libQt6Core.so.6"));
        write_file(&pkg.join("lib/libQt6Core.dylib"));
        write_file(&pkg.join("bin/Qt6Core.dll"));
        write_file(&pkg.join("res/archdatadir/plugins/platforms/libqxcb.so"));
        write_file(&pkg.join("res/archdatadir/qml/QtQml/qmldir"));
        PackageInfo {
            name: "qt".to_string(),
            package_folder: pkg.clone(),
            libdirs: vec![pkg.join("lib")],
            bindirs: vec![pkg.join("bin")],
        }
    }

    fn ctx_for(os: Os, root: &Path, packages: Vec<PackageInfo>) -> BuildContext {
        BuildContext::new(
            settings(os),
            RecipeConfig::default(),
            root.join("build"),
            packages,
        )
    }

    #[test]
    fn test_apply_options_forces_modules_and_features() {
        let mut table = OptionTable::new();
        apply_options(&settings(Os::Linux), &mut table);

        let bag = table.get("qt").unwrap();
        assert_eq!(bag.get("opengl"), Some(&OptionValue::from("no")));
        assert_eq!(bag.get("qtsvg"), Some(&OptionValue::Bool(true)));
        assert_eq!(bag.get("qtshadertools"), Some(&OptionValue::Bool(true)));
        assert_eq!(bag.get("qtwayland"), Some(&OptionValue::Bool(false)));
        assert!(table.get("harfbuzz").is_none());
    }

    #[test]
    fn test_apply_options_touches_harfbuzz_off_linux() {
        let mut table = OptionTable::new();
        apply_options(&settings(Os::Macos), &mut table);

        assert_eq!(
            table.get("harfbuzz").and_then(|b| b.get("with_glib")),
            Some(&OptionValue::Bool(false))
        );
        assert!(table.get("qt").unwrap().get("qtwayland").is_none());
    }

    #[test]
    fn test_qt_conf_prefix_is_package_folder_on_every_platform() {
        for os in [Os::Windows, Os::Macos, Os::Linux] {
            let tmp = tempfile::tempdir().unwrap();
            let info = qt_package(tmp.path());
            let ctx = ctx_for(os, tmp.path(), vec![info.clone()]);

            let content = qt_conf_content(&ctx, &info).unwrap();
            let prefix_line = format!("Prefix = {}", normalized(&info.package_folder));
            assert!(content.contains(&prefix_line), "{os}: {content}");
            assert!(content.starts_with("[Paths]"));
        }
    }

    #[test]
    fn test_qt_conf_linux_template_points_into_libdir() {
        let tmp = tempfile::tempdir().unwrap();
        let info = qt_package(tmp.path());
        let ctx = ctx_for(Os::Linux, tmp.path(), vec![info.clone()]);

        let content = qt_conf_content(&ctx, &info).unwrap();
        assert!(content.contains("Plugins = ../lib/qt6/plugins"));
        assert!(content.contains("Qml2Imports = ../lib/qt6/qml"));
        assert!(!content.contains("Translations"));
    }

    #[test]
    fn test_qt_conf_location_per_platform() {
        for (os, expected) in [
            (Os::Windows, "build/qt.conf"),
            (Os::Macos, "build/Audacity.app/Contents/Resources/qt.conf"),
            (Os::Linux, "build/bin/qt.conf"),
        ] {
            let tmp = tempfile::tempdir().unwrap();
            let info = qt_package(tmp.path());
            let ctx = ctx_for(os, tmp.path(), vec![info.clone()]);
            let mut snippets = Snippets::new();

            copy_files(&ctx, &info, &mut snippets, &RecordingPatcher::new()).unwrap();

            assert!(tmp.path().join(expected).exists(), "{os}: {expected}");
        }
    }

    #[test]
    fn test_linux_plugin_deployment_sets_rpath_and_strips() {
        let tmp = tempfile::tempdir().unwrap();
        let info = qt_package(tmp.path());
        let ctx = ctx_for(Os::Linux, tmp.path(), vec![info.clone()]);
        let patcher = RecordingPatcher::new();
        let mut snippets = Snippets::new();

        copy_files(&ctx, &info, &mut snippets, &patcher).unwrap();

        let plugin = tmp
            .path()
            .join("build/lib/qt6/plugins/platforms/libqxcb.so");
        assert!(plugin.exists());
        // Not a .so file, but still deployed with the tree.
        assert!(tmp.path().join("build/lib/qt6/qml/QtQml/qmldir").exists());

        let events = patcher.events();
        assert!(events.contains(&PatchEvent::SetRpath {
            file: plugin.clone(),
            rpath: "$ORIGIN:$ORIGIN/../../..".to_string(),
        }));
        assert!(events.contains(&PatchEvent::StripDebug { file: plugin }));
    }

    #[test]
    fn test_missing_aux_deps_do_not_abort_placement() {
        // No pcre2/zlib/double-conversion packages in the context: every
        // auxiliary fixup fails, placement still completes.
        let tmp = tempfile::tempdir().unwrap();
        let info = qt_package(tmp.path());
        let ctx = ctx_for(Os::Windows, tmp.path(), vec![info.clone()]);
        let mut snippets = Snippets::new();

        copy_files(&ctx, &info, &mut snippets, &RecordingPatcher::new()).unwrap();

        assert!(tmp.path().join("build/Qt6Core.dll").exists());
        assert!(tmp.path().join("build/qt.conf").exists());
    }

    #[test]
    fn test_crossbuild_snippet_and_host_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let info = qt_package(tmp.path());
        let tools = PackageInfo {
            name: "qt-tools".to_string(),
            package_folder: tmp.path().join("pkgs/qt-tools"),
            libdirs: vec![],
            bindirs: vec![],
        };
        let mut ctx = ctx_for(Os::Linux, tmp.path(), vec![info.clone(), tools.clone()]);
        ctx.settings.cross_compiling = true;
        let mut snippets = Snippets::new();

        copy_files(&ctx, &info, &mut snippets, &RecordingPatcher::new()).unwrap();

        let pre = snippets.pre().unwrap();
        assert!(pre.contains("QT_HOST_PATH"));
        assert!(pre.contains(&normalized(&tools.package_folder)));

        let conf = fs::read_to_string(tmp.path().join("build/bin/qt.conf")).unwrap();
        assert!(conf.contains(&format!(
            "HostPrefix = {}",
            normalized(&tools.package_folder)
        )));
    }

    #[test]
    fn test_crossbuild_without_host_tools_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let info = qt_package(tmp.path());
        let mut ctx = ctx_for(Os::Linux, tmp.path(), vec![info.clone()]);
        ctx.settings.cross_compiling = true;
        let mut snippets = Snippets::new();

        let result = copy_files(&ctx, &info, &mut snippets, &RecordingPatcher::new());
        assert!(result.is_err());
    }
}
