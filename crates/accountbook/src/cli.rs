//! Command-line arguments.

use std::path::PathBuf;

use accountbook_core::AccountType;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "accountbook")]
#[command(about = "Manage locally stored LDAP and local accounts", long_about = None)]
pub struct Cli {
    /// Directory holding the account store
    #[arg(long, global = true, env = "ACCOUNTBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all accounts in order
    List,
    /// Create a blank local account and print its id
    Add,
    /// Show a single account
    Show {
        /// Account id
        id: String,
    },
    /// Update an account, creating it if the id is unknown
    Set(SetArgs),
    /// Delete an account; unknown ids are ignored
    Remove {
        /// Account id
        id: String,
    },
}

/// Fields accepted by `set`. Omitted fields keep their current value.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SetArgs {
    /// Account id
    pub id: String,
    /// Authentication mechanism (ldap or local)
    #[arg(long = "type")]
    pub kind: Option<AccountType>,
    /// Principal name
    #[arg(long)]
    pub login: Option<String>,
    /// Password to store
    #[arg(long, conflicts_with = "no_password")]
    pub password: Option<String>,
    /// Clear the stored password
    #[arg(long)]
    pub no_password: bool,
    /// Label fragment; repeat to build a multi-part label
    #[arg(long = "label")]
    pub labels: Vec<String>,
}
