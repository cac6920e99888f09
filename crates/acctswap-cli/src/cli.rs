use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "acctswap")]
#[command(about = "Switch the host application between saved accounts")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Alias of an account to switch to (opens a picker if omitted)
    pub token: Option<String>,

    /// Settings file (defaults to <config dir>/acctswap/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List managed accounts
    List,

    /// Start managing the account that is currently logged in
    Add {
        /// Alias to attach to the new account
        #[arg(long)]
        alias: Option<String>,
    },

    /// Stop managing an account and delete its backups
    Remove {
        /// Id, position or email (opens a picker if omitted)
        identifier: Option<String>,
    },

    /// Switch to the next account in order
    Next,

    /// Show which account is logged in
    Status,

    /// Attach an alias to an account
    Alias {
        name: String,
        /// Email of the account (defaults to the logged-in one)
        email: Option<String>,
    },

    /// Switch to an account by id, position or email
    Switch { identifier: String },
}

/// Exit code after a parse failure: 0 for `--help` and `--version`, else 1
pub fn exit_code(err: &clap::Error) -> ExitCode {
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
