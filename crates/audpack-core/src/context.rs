//! Build settings and the per-generate context handed to descriptors.

use std::collections::BTreeMap;
use std::path::PathBuf;

use audpack_schema::{BuildType, Os, PackageInfo};

use crate::APP_BUNDLE;
use crate::config::RecipeConfig;

/// Platform and configuration settings of the consuming build.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Target operating-system family.
    pub os: Os,
    /// Build configuration of the application.
    pub build_type: BuildType,
    /// Whether the target platform differs from the build host.
    pub cross_compiling: bool,
}

/// Everything the placement phase needs: settings, the recipe config, the
/// build output folder, and the set of built packages.
///
/// Packages keep their hand-off order; descriptors are invoked over them
/// strictly in sequence.
#[derive(Debug)]
pub struct BuildContext {
    /// Platform and configuration settings.
    pub settings: BuildSettings,
    /// User-facing recipe switches.
    pub config: RecipeConfig,
    /// Root of the consuming application's build output tree.
    pub build_folder: PathBuf,
    packages: Vec<PackageInfo>,
    index: BTreeMap<String, usize>,
}

impl BuildContext {
    /// Create a context over the given built packages.
    pub fn new(
        settings: BuildSettings,
        config: RecipeConfig,
        build_folder: PathBuf,
        packages: Vec<PackageInfo>,
    ) -> Self {
        let index = packages
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Self {
            settings,
            config,
            build_folder,
            packages,
            index,
        }
    }

    /// The built packages in hand-off order.
    pub fn packages(&self) -> &[PackageInfo] {
        &self.packages
    }

    /// Look up a built package by name.
    pub fn package(&self, name: &str) -> Option<&PackageInfo> {
        self.index.get(name).map(|&i| &self.packages[i])
    }

    /// A subdirectory of the macOS application bundle, e.g.
    /// `<build>/Audacity.app/Contents/Frameworks`.
    pub fn bundle_dir(&self, subdir: &str) -> PathBuf {
        self.build_folder
            .join(APP_BUNDLE)
            .join("Contents")
            .join(subdir)
    }

    /// Name of the Linux library directory (`lib` unless overridden).
    pub fn linux_libdir_name(&self) -> &str {
        self.config.lib_dir()
    }

    /// The Linux shared-library target directory, e.g. `<build>/lib`.
    pub fn linux_libdir(&self) -> PathBuf {
        self.build_folder.join(self.linux_libdir_name())
    }

    /// Where generated build-configuration files are written.
    pub fn generators_folder(&self) -> PathBuf {
        self.build_folder.join("generators")
    }
}
