mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "socdash-cli")]
#[command(about = "Social dashboard statistics command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Save the current month's totals now (once per day unless forced)
    Save {
        /// Write even if today's save already happened
        #[arg(long)]
        force: bool,
    },
    /// Print the 12-month series for a year as JSON
    Series {
        /// Calendar year; defaults to the current year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Re-host one remote image and print its public URL
    Rehost {
        /// Absolute http(s) URL of the image
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("socdash-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = socdash_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Save { force } => commands::run_save(&config, force).await,
        Commands::Series { year } => commands::run_series(&config, year).await,
        Commands::Rehost { url } => commands::run_rehost(&config, &url).await,
    }
}

#[cfg(test)]
mod tests;
