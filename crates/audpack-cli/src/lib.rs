//! audpack - dependency packaging driver for the Audacity build
//!
//! The external build orchestrator invokes one subcommand per lifecycle
//! phase, in order:
//!
//! 1. `requirements` — which package references to fetch (and, with
//!    `--build`, which build-time tools).
//! 2. `configure` — the option table to apply before anything is built.
//! 3. `generate` — place every built package's runtime files into the
//!    application's output tree.

pub mod cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use audpack_schema::{BuildType, Os};

/// Command-line interface of the `audpack` binary.
#[derive(Debug, Parser)]
#[command(name = "audpack")]
#[command(author, version, about = "Dependency packaging for the Audacity build")]
pub struct Cli {
    /// Path to the recipe configuration (missing file = all defaults)
    #[arg(long, global = true, default_value = "audpack.toml")]
    pub config: PathBuf,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// One subcommand per lifecycle phase.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the package references of the enabled dependencies
    Requirements {
        /// Target operating-system family
        #[arg(long)]
        os: Os,
        /// Print build-time tool references instead of host requirements
        #[arg(long)]
        build: bool,
        /// The target platform differs from the build host
        #[arg(long)]
        cross: bool,
    },
    /// Resolve and emit the package option table (TOML)
    Configure {
        /// Target operating-system family
        #[arg(long)]
        os: Os,
        /// The target platform differs from the build host
        #[arg(long)]
        cross: bool,
        /// Write the table to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Copy built packages' runtime files into the build output tree
    Generate {
        /// Target operating-system family
        #[arg(long)]
        os: Os,
        /// Build configuration of the application
        #[arg(long)]
        build_type: BuildType,
        /// Root of the application's build output tree
        #[arg(long)]
        build_folder: PathBuf,
        /// JSON description of the built packages, in build order
        #[arg(long)]
        deps_info: PathBuf,
        /// The target platform differs from the build host
        #[arg(long)]
        cross: bool,
    },
}
