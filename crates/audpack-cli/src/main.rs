//! audpack - dependency packaging CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use audpack_cli::cmd;
use audpack_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Requirements { os, build, cross } => {
            cmd::requirements::requirements(&config, os, build, cross)
        }
        Commands::Configure { os, cross, out } => {
            cmd::configure::configure(&config, os, cross, out.as_deref())
        }
        Commands::Generate {
            os,
            build_type,
            build_folder,
            deps_info,
            cross,
        } => cmd::generate::generate(&config, os, build_type, &build_folder, &deps_info, cross),
    }
}
