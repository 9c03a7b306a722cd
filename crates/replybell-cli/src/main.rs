use clap::{Parser, Subcommand};

mod commands;
mod host;

#[derive(Parser)]
#[command(
    name = "replybell",
    version,
    about = "Notify when an AI response finishes generating"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a page snapshot file and notify when generations finish
    Watch(commands::watch::WatchArgs),
    /// Run the monitor over a scripted scenario on simulated time
    Replay(commands::replay::ReplayArgs),
    /// Show which actions a given duration would fire
    Resolve(commands::resolve::ResolveArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Watch(args) => commands::watch::run(args),
        Commands::Replay(args) => commands::replay::run(args),
        Commands::Resolve(args) => commands::resolve::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
