//! `accountbook` - manage locally stored LDAP and local accounts.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config;

use accountbook_core::AccountStore;
use accountbook_core::storage::FileBackend;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::Config;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accountbook=info,accountbook_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir);
    debug!("Using data directory {:?}", config.data_dir);

    let mut store = AccountStore::open(FileBackend::new(&config.data_dir));
    let mut stdout = std::io::stdout().lock();
    commands::run(&mut store, cli.command, cli.json, &mut stdout)
}
