//! The recipe orchestrator.
//!
//! Drives the dependency table through the three lifecycle phases the
//! external build orchestrator invokes, in strict order: requirements,
//! then option application (before anything is built), then file
//! placement (after everything is built). No phase overlaps another.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use audpack_schema::{BuildType, OptionTable, Os};

use crate::config::RecipeConfig;
use crate::context::{BuildContext, BuildSettings};
use crate::descriptor::Descriptor;
use crate::placement::copy_runtime_files;
use crate::relinker::{ORIGIN, PATCHELF_REFERENCE, PathPatcher};
use crate::snippets::Snippets;
use crate::table::dependency_table;

/// Outcome of the generate phase.
#[derive(Debug)]
pub struct GenerateReport {
    /// Snippet lines contributed during placement, in contribution order.
    pub snippets: Snippets,
    /// Generated snippet files actually written (only for the
    /// debug-info-preserving build configuration).
    pub written: Vec<PathBuf>,
}

/// The dependency recipe: the static table plus the phase logic over it.
#[derive(Debug)]
pub struct Recipe {
    dependencies: Vec<Descriptor>,
    index: BTreeMap<String, usize>,
}

impl Default for Recipe {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe {
    /// Build the recipe over the static dependency table.
    pub fn new() -> Self {
        let dependencies = dependency_table();
        let index = dependencies
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();
        Self {
            dependencies,
            index,
        }
    }

    /// The full dependency table, in declaration order.
    pub fn dependencies(&self) -> &[Descriptor] {
        &self.dependencies
    }

    /// Look up a descriptor by package name.
    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.index.get(name).map(|&i| &self.dependencies[i])
    }

    /// The descriptors enabled under the given configuration, in table
    /// order.
    pub fn enabled<'a>(&'a self, config: &'a RecipeConfig) -> impl Iterator<Item = &'a Descriptor> {
        self.dependencies
            .iter()
            .filter(|d| config.enabled_for(d.name(), d.default_enabled()))
    }

    /// Package references of the enabled dependencies.
    pub fn requirements(&self, config: &RecipeConfig) -> Vec<String> {
        self.enabled(config).map(Descriptor::reference).collect()
    }

    /// Build-time tool references: the ELF patching tool on the ELF
    /// family, plus whatever the enabled descriptors declare.
    pub fn build_requirements(
        &self,
        settings: &BuildSettings,
        config: &RecipeConfig,
    ) -> Vec<String> {
        let mut refs = Vec::new();

        if settings.os == Os::Linux {
            refs.push(PATCHELF_REFERENCE.to_string());
        }

        for descriptor in self.enabled(config) {
            refs.extend(descriptor.tool_requires(settings));
        }

        refs
    }

    /// Resolve the option table: every package is built shared, then each
    /// enabled descriptor applies its options in table order.
    ///
    /// Runs strictly before any package is built, and is idempotent.
    pub fn configure(&self, settings: &BuildSettings, config: &RecipeConfig) -> OptionTable {
        let mut table = OptionTable::new();
        table.package(OptionTable::WILDCARD).set("shared", true);

        for descriptor in self.enabled(config) {
            info!("Applying options for {}...", descriptor.name());
            descriptor.apply_options(settings, config, &mut table);
        }

        table
    }

    /// Place every built package's runtime files, in hand-off order.
    ///
    /// Packages without a descriptor (transitive dependencies) get the
    /// generic placement. Afterwards the ICU data-library fixup runs on
    /// the ELF family, and the accumulated snippets are written out when
    /// the build configuration keeps debug info.
    ///
    /// # Errors
    ///
    /// Returns an error if any non-best-effort copy, patch, or write
    /// fails.
    pub fn generate(&self, ctx: &BuildContext, patcher: &dyn PathPatcher) -> Result<GenerateReport> {
        let mut snippets = Snippets::new();

        for info in ctx.packages() {
            info!("Copying files for {}...", info.name);
            match self.descriptor(&info.name) {
                Some(descriptor) => descriptor.copy_files(ctx, info, &mut snippets, patcher)?,
                None => copy_runtime_files(ctx, info, patcher)?,
            }
        }

        self.fix_icu_data_library(ctx, patcher)?;

        let mut written = Vec::new();
        if ctx.settings.build_type == BuildType::RelWithDebInfo {
            written = snippets.write_to(&ctx.generators_folder())?;
        }

        Ok(GenerateReport { snippets, written })
    }

    /// ICU is not an Audacity dependency but arrives through Qt, and on
    /// the ELF family it cannot locate its own data library without a
    /// self-relative rpath entry.
    fn fix_icu_data_library(&self, ctx: &BuildContext, patcher: &dyn PathPatcher) -> Result<()> {
        if ctx.settings.os != Os::Linux {
            return Ok(());
        }
        let Some(icu) = ctx.package("icu") else {
            return Ok(());
        };
        let Some(libdir) = icu.first_libdir() else {
            return Ok(());
        };

        for entry in fs::read_dir(libdir)? {
            let path = entry?.path();
            if path.is_file() {
                patcher.append_rpath(&path, ORIGIN)?;
            }
        }

        Ok(())
    }
}
