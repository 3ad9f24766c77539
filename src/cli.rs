use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compile a software catalog with knowledge-base, directory and release data
#[derive(Parser, Debug)]
#[command(name = "catalog-compiler")]
#[command(version)]
#[command(
    about = "Compile a software catalog with knowledge-base, directory and release data",
    long_about = None
)]
pub struct Args {
    /// Configuration file (defaults to ./catalog-compiler.config.yml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Catalog snapshot file, overrides the configured path
    #[arg(long, global = true, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Compiled snapshot file, overrides the configured path
    #[arg(long, global = true, value_name = "FILE")]
    pub compiled: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Compile the catalog once and store the result
    Compile {
        /// Ignore the previous compilation and fetch everything again
        #[arg(long)]
        full: bool,

        /// Maximum number of records compiled concurrently
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        max_concurrent_records: Option<u64>,
    },

    /// Serve: compile at startup, then recompile everything periodically until interrupted
    Run {
        /// Hours between two full recompilations
        #[arg(
            long,
            value_name = "HOURS",
            value_parser = clap::value_parser!(u64).range(1..=crate::config::MAX_HOURS)
        )]
        interval_hours: Option<u64>,
    },

    /// Print the software similar to the named one, from the stored compilation
    Similar {
        /// Catalog name of the software
        name: String,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
