pub mod commands;
pub mod formatter;
pub mod visualize;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kerf",
    version,
    about = "Split a gene family tree into sub-families by pairwise sequence identity",
    long_about = "Kerf decomposes a gene family tree and its multiple sequence alignment into \
                  disjoint clusters in which every pair of sequences meets an identity cutoff. \
                  Each cluster is written as an alignment subset and a pruned tree."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Configuration file (defaults to KERF_CONFIG, then the per-user config)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a tree into identity-bounded clusters
    Split(commands::split::SplitArgs),

    /// Show pairwise identities or traversal weights for an alignment
    Identity(commands::identity::IdentityArgs),

    /// Show or initialise configuration
    Config(commands::config::ConfigArgs),
}
