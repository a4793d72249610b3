// src/main.rs

use anyhow::Result;
use clap::Parser;
use planex::cli::{Cli, Commands};
use planex::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Clone(args) => {
            commands::clone::run(&args)?;
        }
        Commands::Configure(args) => {
            if let Err(err) = commands::configure::run(&args) {
                if let planex::Error::MissingRepository(path) = &err {
                    eprintln!(
                        "No repository at {}: have you run 'planex clone'?",
                        path.display()
                    );
                }
                return Err(err.into());
            }
        }
    }
    Ok(())
}
