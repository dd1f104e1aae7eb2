use clap::Parser;
use colored::*;
use kerf::cli::{Cli, Commands};
use kerf::core::config::resolve_config;
use kerf::utils::parallel::configure_thread_pool;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins, then KERF_LOG, then the -v count
    let fallback = std::env::var("KERF_LOG").unwrap_or_else(|_| {
        match cli.verbose {
            0 => "info",
            1 => "kerf=debug,info",
            _ => "trace",
        }
        .to_string()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    kerf::cli::formatter::init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = e
            .downcast_ref::<kerf::KerfError>()
            .map(kerf::KerfError::exit_code)
            .unwrap_or(1);
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let threads = configure_thread_pool(cli.threads)?;
    if cli.verbose > 0 {
        eprintln!("Using {} threads", threads);
    }

    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Split(args) => kerf::cli::commands::split::run(args, config),
        Commands::Identity(args) => kerf::cli::commands::identity::run(args, config),
        Commands::Config(args) => kerf::cli::commands::config::run(args, config),
    }
}
