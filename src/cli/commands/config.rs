use crate::cli::formatter::{print_success, print_tip};
use crate::core::config::{default_config, save_config, user_config_path, Config};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write a default configuration file to this path instead of printing
    #[arg(long, value_name = "PATH")]
    pub init: Option<PathBuf>,

    /// Overwrite an existing file with --init
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: ConfigArgs, config: Config) -> anyhow::Result<()> {
    match args.init {
        Some(path) => {
            if path.exists() && !args.force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            save_config(&path, &default_config())?;
            print_success(&format!("Wrote default configuration to {}", path.display()));
        }
        None => {
            print!("{}", toml::to_string_pretty(&config)?);
            if let Some(path) = user_config_path() {
                if !path.exists() {
                    print_tip(&format!("kerf config --init {} creates a config file", path.display()));
                }
            }
        }
    }
    Ok(())
}
