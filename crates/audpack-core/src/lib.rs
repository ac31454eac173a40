//! Dependency packaging for the Audacity build.
//!
//! The build orchestrator drives three lifecycle phases, in order, over a
//! static table of dependency descriptors: `requirements` (which packages
//! to fetch), `configure` (which options to apply before anything is
//! built), and `generate` (where each built package's runtime files land
//! in the application's output tree).

pub mod config;
pub mod context;
pub mod descriptor;
pub mod placement;
pub mod qt;
pub mod recipe;
pub mod relinker;
pub mod snippets;
pub mod table;

pub use config::RecipeConfig;
pub use context::{BuildContext, BuildSettings};
pub use descriptor::Descriptor;
pub use recipe::{GenerateReport, Recipe};
pub use relinker::{NullPatcher, ORIGIN, Patchelf, PathPatcher};
pub use snippets::Snippets;

/// Name of the macOS application bundle the placement step targets.
pub const APP_BUNDLE: &str = "Audacity.app";
