use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "sample-collector",
    about = "Forensic sample collection: locate, hash, and archive file samples under hierarchical budgets"
)]
pub struct Args {
    /// Path to the collection configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Override the configured output path
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Override the configured output format (archive or directory)
    #[clap(long)]
    pub format: Option<String>,

    /// Index off-limits samples with digests by draining their streams
    #[clap(long)]
    pub report_all: bool,

    /// Ignore every configured ceiling
    #[clap(long)]
    pub no_limits: bool,

    /// Do not recurse into subdirectories of the configured locations
    #[clap(long)]
    pub no_recurse: bool,

    /// Write a JSON run summary to the given path
    #[clap(long)]
    pub summary: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a starter configuration file
    InitConfig {
        /// Where to write the configuration
        #[clap(default_value = "collection.yaml")]
        path: PathBuf,
    },
}
