//! joblog CLI - Command-line job application tracker
//!
//! Records live in a local database and are pushed to, or pulled from, a
//! remote store only when asked.

mod cli;
mod commands;
mod error;


use clap::Parser;
use joblog_core::config::RemoteConfig;
use joblog_core::search::ApplicationFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::{run_push, run_sync};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "joblog=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Commands::Add(args) => run_add(&args, &db_path).await?,
        Commands::List {
            company,
            from,
            to,
            json,
        } => {
            let filter = ApplicationFilter {
                company: company
                    .map(|company| company.trim().to_string())
                    .filter(|company| !company.is_empty()),
                start_date: from,
                end_date: to,
            };
            run_list(&filter, json, &db_path).await?;
        }
        Commands::Show { id, json } => run_show(&id, json, &db_path).await?,
        Commands::Edit(args) => run_edit(&args, &db_path).await?,
        Commands::Delete { id } => run_delete(&id, &db_path).await?,
        Commands::Push => {
            let remote = RemoteConfig::from_env()?;
            run_push(&db_path, remote.as_ref()).await?;
        }
        Commands::Sync { force } => {
            let remote = RemoteConfig::from_env()?;
            run_sync(&db_path, remote.as_ref(), force).await?;
        }
        Commands::Status => {
            let remote = RemoteConfig::from_env()?;
            run_status(&db_path, remote.as_ref()).await?;
        }
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), &db_path).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
