use clap::Subcommand;
use std::path::PathBuf;

use replybell_core::Config;

use super::load_config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the default config file location
    Path,
    /// Print the effective config as JSON
    Show {
        /// Config file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Get a config value
    Get {
        /// Config key (e.g. "verbosity", "monitor.poll_interval_ms")
        key: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the default config file
    Init {
        /// Target path (defaults to the user config location)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate a config file
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Path => {
            println!("{}", Config::default_path()?.display());
        }
        ConfigAction::Show { config } => {
            let config = load_config(config.as_deref())?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Get { key, config } => {
            let config = load_config(config.as_deref())?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => Config::default_path()?,
            };
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            Config::write_default(&path)?;
            println!("wrote {}", path.display());
        }
        ConfigAction::Check { config } => {
            let config = load_config(config.as_deref())?;
            let thresholds = config.rule_set()?.thresholds();
            println!("ok: {} thresholds {:?}", thresholds.len(), thresholds);
        }
    }
    Ok(())
}
