//! `jamail` - headless IMAPS mail client
//!
//! Lists the inbox of every configured account and keeps a header cache
//! for offline use.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod driver;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use driver::Options;

/// Command line.
#[derive(Debug, Parser)]
#[command(name = "jamail", version, about = "List IMAPS inboxes and cache their headers")]
struct Cli {
    /// Log at debug level.
    #[arg(short, long)]
    debug: bool,

    /// Configuration file [default: <config dir>/jamail/config.json].
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fetch and print the body of this message after the list.
    #[arg(long, value_name = "ID", conflicts_with = "offline")]
    fetch: Option<u32>,

    /// Only print the cached headers.
    #[arg(long)]
    offline: bool,
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("jamail={level},jamail_imap={level},jamail_core={level}").into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&path)?;
    if config.accounts.is_empty() {
        anyhow::bail!("no accounts configured in {}", path.display());
    }

    let options = Options {
        fetch: cli.fetch,
        offline: cli.offline,
    };
    let cache_dir = config.cache_dir();
    info!(cache = %cache_dir.display(), accounts = config.accounts.len(), "starting jamail");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(driver::run(&config.accounts, &cache_dir, options))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jamail ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}
