//! Roster operator CLI
//!
//! Maintenance tasks that run against tenant databases directly, without the server.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Roster operator tool",
    long_about = "Inspect configured tenants, synchronize tenant schemas and\n\
                  bootstrap admin accounts."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "ROSTER_CONFIG",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured tenants
    Tenants,

    /// Create missing tables in tenant databases
    SyncSchema {
        /// Only this tenant (default: all)
        #[arg(short, long)]
        tenant: Option<String>,
    },

    /// Create an admin panel account
    CreateAdmin {
        /// Tenant the account belongs to
        #[arg(short, long)]
        tenant: String,

        #[arg(short, long)]
        username: String,

        /// admin, officer or viewer
        #[arg(short, long, default_value = "admin")]
        role: String,

        #[arg(short, long, env = "ROSTER_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Commands::Tenants => commands::tenants::run(&cli.config).await,
        Commands::SyncSchema { tenant } => {
            commands::schema::run(&cli.config, tenant.as_deref()).await
        }
        Commands::CreateAdmin {
            tenant,
            username,
            role,
            password,
        } => commands::admin::run(&cli.config, &tenant, &username, &role, &password).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if cli.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}
