//! cmdb-e2e - end-to-end UI suite for CMDB
//!
//! Usage:
//!   cmdb-e2e run                  Run every scenario
//!   cmdb-e2e run --filter login   Run scenarios whose id contains "login"
//!   cmdb-e2e run --headed         Show the browser window
//!   cmdb-e2e list                 List scenario ids
//!
//! Configuration comes from the environment (BASE_URL, LOGIN, PASSWORD,
//! CERT_PFX_PATH, CERT_PFX_PASSWORD, HEADLESS, ARTIFACTS_DIR, RUST_LOG).
//!
//! Exit status: 0 when no test failed, 1 when a test failed, 2 when the run
//! itself could not be carried out.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmdb_core::RunConfig;
use cmdb_harness::run_suite;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "cmdb-e2e")]
#[command(author, version, about = "End-to-end UI suite for CMDB")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the suite against BASE_URL
    Run {
        /// Only run scenarios whose id contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Show the browser window (overrides HEADLESS)
        #[arg(long)]
        headed: bool,
    },

    /// List scenario ids
    List {
        /// Only list ids containing this text
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { filter, headed } => cmd_run(filter, headed).await,
        Commands::List { filter } => cmd_list(filter),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("Run aborted: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn cmd_run(filter: Option<String>, headed: bool) -> Result<ExitCode> {
    let mut config = RunConfig::from_env().context("Invalid run configuration")?;
    if headed {
        config.headless = false;
    }

    let scenarios = cmdb_scenarios::suite();
    let summary = run_suite(&config, &scenarios, filter)
        .await
        .context("Test run failed")?;

    println!("{}", summary);
    Ok(if summary.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_list(filter: Option<String>) -> Result<ExitCode> {
    let filter = filter.unwrap_or_default();
    for scenario in cmdb_scenarios::suite() {
        let id = scenario.id();
        if id.contains(&filter) {
            println!("{}", id);
        }
    }
    Ok(ExitCode::SUCCESS)
}
