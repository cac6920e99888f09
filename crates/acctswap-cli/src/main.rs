//! acctswap binary
//!
//! Parses the command line, wires an `AccountManager` from settings, and
//! prints results. Every failure ends as a single `Error: ...` line on stderr
//! with exit code 1; a cancelled prompt exits 0.

mod cli;
mod picker;
mod render;

use std::process::ExitCode;
use std::sync::Arc;

use acctswap_core::logging::file_logger;
use acctswap_core::{AccountManager, ConsoleLogger, Selection, Settings, SharedLogger};
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::picker::StdinPicker;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return cli::exit_code(&e);
        }
    };
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            file_logger::error("main", &e.to_string());
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?.with_env_overrides(),
        None => Settings::load()?,
    };
    let logger: SharedLogger = Arc::new(if cli.verbose {
        ConsoleLogger::verbose()
    } else {
        ConsoleLogger::new()
    });
    let manager = AccountManager::from_settings(&settings, logger)?;

    match cli.command {
        Some(Commands::List) => println!("{}", render::list(&manager.list().await?)),
        Some(Commands::Status) => println!("{}", render::status(&manager.status().await?)),
        Some(Commands::Add { alias }) => {
            let account = manager.add_current(alias.as_deref()).await?;
            println!("{}", render::added(&account));
        }
        Some(Commands::Remove {
            identifier: Some(identifier),
        }) => println!("{}", render::removed(&manager.remove(&identifier).await?)),
        Some(Commands::Remove { identifier: None }) => {
            match manager.remove_interactive(&StdinPicker).await? {
                Selection::Done(report) => println!("{}", render::removed(&report)),
                Selection::Cancelled => println!("Cancelled"),
            }
        }
        Some(Commands::Next) => println!("{}", render::switched(&manager.next().await?)),
        Some(Commands::Switch { identifier }) => {
            println!("{}", render::switched(&manager.switch(&identifier).await?))
        }
        Some(Commands::Alias { name, email }) => {
            let account = manager.set_alias(&name, email.as_deref()).await?;
            println!("{}", render::aliased(name.trim(), &account));
        }
        None => match cli.token {
            Some(token) => {
                println!("{}", render::switched(&manager.switch_alias(&token).await?))
            }
            None => match manager.switch_interactive(&StdinPicker).await? {
                Selection::Done(outcome) => println!("{}", render::switched(&outcome)),
                Selection::Cancelled => println!("Cancelled"),
            },
        },
    }
    Ok(())
}
