//! Dependency descriptors.
//!
//! One record per external library: identity, version, channel, the
//! options to force on the package, and whether it is enabled when the
//! user configures nothing. A small closed set of specializations layers
//! platform-conditional options or bespoke file placement on top of the
//! generic behavior; the variant is chosen once, when the table is built.

use anyhow::Result;
use tracing::debug;

use audpack_schema::{DEFAULT_CHANNEL, Os, OptionBag, OptionTable, OptionValue, PackageInfo};

use crate::config::RecipeConfig;
use crate::context::{BuildContext, BuildSettings};
use crate::placement::{copy_matching, copy_runtime_files};
use crate::qt;
use crate::relinker::PathPatcher;
use crate::snippets::Snippets;

/// Filename of the crash-reporting handler executable (before any
/// platform suffix).
const CRASHPAD_HANDLER: &str = "crashpad_handler";

/// The closed set of descriptor behaviors.
///
/// Everything not listed here uses the generic option application and the
/// generic platform-dispatched copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialization {
    /// Generic behavior only.
    Generic,
    /// UI-toolkit binding: fixed feature flags, flattened DLL copy on
    /// Windows.
    WxWidgets,
    /// Crash-reporting tool: places its handler executable per platform.
    Crashpad,
    /// Audio I/O library: platform-conditional host-API options.
    PortAudio,
    /// HTTP client library: per-platform TLS backend.
    Curl,
    /// The Qt framework: forced modules, auxiliary-library fixups, plugin
    /// deployment, `qt.conf` generation.
    Qt6,
}

/// Static description of one external library dependency.
#[derive(Debug, Clone)]
pub struct Descriptor {
    name: String,
    version: String,
    channel: Option<String>,
    options: OptionBag,
    default_enabled: bool,
    spec: Specialization,
}

impl Descriptor {
    /// A generic descriptor with no forced options.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            channel: None,
            options: OptionBag::new(),
            default_enabled: false,
            spec: Specialization::Generic,
        }
    }

    /// Set an explicit distribution channel.
    #[must_use]
    pub fn with_channel(mut self, channel: &str) -> Self {
        self.channel = Some(channel.to_string());
        self
    }

    /// Add forced package options.
    #[must_use]
    pub fn with_options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<OptionValue>,
    {
        for (key, value) in options {
            self.options.set(key, value);
        }
        self
    }

    /// The UI-toolkit binding (custom wxWidgets fork).
    pub fn wxwidgets() -> Self {
        Self {
            spec: Specialization::WxWidgets,
            ..Self::new("wxwidgets", "3.1.3.4-audacity")
        }
    }

    /// The crash-reporting handler tool.
    pub fn crashpad(version: &str) -> Self {
        Self {
            spec: Specialization::Crashpad,
            ..Self::new("crashpad", version)
        }
    }

    /// The audio I/O library.
    pub fn portaudio() -> Self {
        Self {
            spec: Specialization::PortAudio,
            ..Self::new("portaudio", "19.7.0")
        }
    }

    /// The HTTP client library.
    pub fn curl() -> Self {
        Self {
            spec: Specialization::Curl,
            ..Self::new("libcurl", "7.82.0")
        }
    }

    /// The Qt framework.
    pub fn qt6() -> Self {
        Self {
            spec: Specialization::Qt6,
            ..Self::new("qt", qt::QT_VERSION).with_channel(qt::QT_CHANNEL)
        }
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether this dependency is included absent explicit configuration.
    pub fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    /// The behavior variant of this descriptor.
    pub fn specialization(&self) -> Specialization {
        self.spec
    }

    /// Name of the configuration switch exposed for this dependency.
    pub fn switch_name(&self) -> String {
        format!("use_{}", self.name)
    }

    /// The fully-qualified package reference,
    /// `name/version@channel` with the channel defaulting to
    /// `audacity/stable`.
    pub fn reference(&self) -> String {
        let channel = self.channel.as_deref().unwrap_or(DEFAULT_CHANNEL);
        format!("{}/{}@{}", self.name, self.version, channel)
    }

    /// Build-time-only tool package references this dependency needs.
    pub fn tool_requires(&self, settings: &BuildSettings) -> Vec<String> {
        match self.spec {
            Specialization::Qt6 if settings.cross_compiling => {
                vec![qt::QT_TOOLS_REFERENCE.to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// Write this dependency's options into the option table.
    ///
    /// Idempotent: re-applying with the same inputs yields an identical
    /// table. Specializations add platform-conditional entries and, for
    /// Qt, one foreign-package entry.
    pub fn apply_options(
        &self,
        settings: &BuildSettings,
        config: &RecipeConfig,
        table: &mut OptionTable,
    ) {
        for (key, value) in &self.options {
            debug!("\t{}:{key}={value}", self.name);
            table.package(&self.name).set(key, value.clone());
        }

        match self.spec {
            Specialization::Generic | Specialization::Crashpad => {}
            Specialization::WxWidgets => self.apply_wxwidgets_options(config, table),
            Specialization::PortAudio => {
                let bag = table.package(&self.name);
                if settings.os == Os::Windows {
                    bag.set("with_asio", config.use_asio());
                    bag.set("with_wdmks", false);
                }
                if settings.os != Os::Macos {
                    bag.set("with_jack", config.use_jack());
                }
            }
            Specialization::Curl => {
                let backend = match settings.os {
                    Os::Windows => "schannel",
                    Os::Macos => "darwinssl",
                    Os::Linux => "openssl",
                };
                table.package(&self.name).set("with_ssl", backend);
            }
            Specialization::Qt6 => qt::apply_options(settings, table),
        }
    }

    /// The wxWidgets feature set: codec libraries follow the matching
    /// dependency switches (bundled when enabled, system otherwise), and
    /// every module Audacity does not use is switched off.
    fn apply_wxwidgets_options(&self, config: &RecipeConfig, table: &mut OptionTable) {
        let bundled =
            |dep: &str, bundled_name: &str| -> OptionValue {
                if config.switch(dep).unwrap_or(false) {
                    bundled_name.into()
                } else {
                    "sys".into()
                }
            };

        let opts: Vec<(&str, OptionValue)> = vec![
            ("zlib", bundled("zlib", "zlib")),
            ("expat", bundled("expat", "expat")),
            ("png", bundled("libpng", "libpng")),
            ("jpeg", bundled("libjpeg-turbo", "libjpeg-turbo")),
            ("tiff", "off".into()),
            ("compatibility", 3.0.into()),
            ("secretstore", false.into()),
            ("opengl", false.into()),
            ("propgrid", false.into()),
            ("ribbon", false.into()),
            ("richtext", false.into()),
            ("stc", false.into()),
            ("webview", false.into()),
            ("help", false.into()),
            ("html_help", false.into()),
            ("fs_inet", false.into()),
            ("protocol", false.into()),
        ];

        let bag = table.package(&self.name);
        for (key, value) in opts {
            debug!("\t{}:{key}={value}", self.name);
            bag.set(key, value);
        }
    }

    /// Place this dependency's runtime files into the build output tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a required copy or patch operation fails.
    /// Best-effort auxiliary fixups (Qt) log and continue instead.
    pub fn copy_files(
        &self,
        ctx: &BuildContext,
        info: &PackageInfo,
        snippets: &mut Snippets,
        patcher: &dyn PathPatcher,
    ) -> Result<()> {
        match self.spec {
            Specialization::Generic | Specialization::PortAudio | Specialization::Curl => {
                copy_runtime_files(ctx, info, patcher)
            }
            Specialization::WxWidgets => self.copy_wxwidgets_files(ctx, info, patcher),
            Specialization::Crashpad => self.copy_crashpad_files(ctx, info, patcher),
            Specialization::Qt6 => qt::copy_files(ctx, info, snippets, patcher),
        }
    }

    /// On Windows the wxWidgets DLLs live in the lib directory and must
    /// land flattened next to the executable; elsewhere the generic copy
    /// applies.
    fn copy_wxwidgets_files(
        &self,
        ctx: &BuildContext,
        info: &PackageInfo,
        patcher: &dyn PathPatcher,
    ) -> Result<()> {
        if ctx.settings.os != Os::Windows {
            return copy_runtime_files(ctx, info, patcher);
        }

        let Some(libdir) = info.first_libdir() else {
            return Ok(());
        };
        let target = ctx.build_folder.join(ctx.settings.build_type.as_str());
        copy_matching(libdir, "*.dll", &target, true)?;
        Ok(())
    }

    /// The handler executable must sit where the application expects to
    /// spawn it: the build-type folder on Windows, the bundle's `MacOS`
    /// folder on macOS, `bin/` elsewhere. The generic copy still runs for
    /// the tool's libraries.
    fn copy_crashpad_files(
        &self,
        ctx: &BuildContext,
        info: &PackageInfo,
        patcher: &dyn PathPatcher,
    ) -> Result<()> {
        let handler = match ctx.settings.os {
            Os::Windows => format!("{CRASHPAD_HANDLER}.exe"),
            _ => CRASHPAD_HANDLER.to_string(),
        };

        let dst = match ctx.settings.os {
            Os::Windows => ctx.build_folder.join(ctx.settings.build_type.as_str()),
            Os::Macos => ctx.bundle_dir("MacOS"),
            Os::Linux => ctx.build_folder.join("bin"),
        };

        if let Some(bindir) = info.first_bindir() {
            copy_matching(bindir, &handler, &dst, true)?;
        }

        copy_runtime_files(ctx, info, patcher)
    }
}
