//! Finboard CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run dashboard database migrations
//! fb-cli migrate
//!
//! # Bootstrap the first super admin
//! fb-cli user create -e admin@example.com -n "Admin Name" -r super_admin -p 'a long password'
//!
//! # Load lookup tables from spreadsheets
//! fb-cli import master-codes master_codes.xlsx
//! fb-cli import library-codes library.csv
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create dashboard users
//! - `import` - Bulk import master codes or library codes

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fb-cli")]
#[command(author, version, about = "Finboard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// Directory holding the migration files
        #[arg(long, env = "FB_MIGRATIONS_DIR", default_value = "crates/dashboard/migrations")]
        dir: PathBuf,
    },
    /// Manage dashboard users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Import lookup tables from a spreadsheet
    Import {
        #[command(subcommand)]
        target: ImportTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Roles, repeated or comma separated (`super_admin`, `manager`,
        /// `supervisor`, `user`, `ga_fs`)
        #[arg(short, long = "role", required = true)]
        roles: Vec<String>,

        /// Initial password
        #[arg(short, long, env = "FB_BOOTSTRAP_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Unit names to assign, repeated
        #[arg(short, long = "unit")]
        units: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ImportTarget {
    /// Upsert master codes (account code, category, account name, description)
    MasterCodes {
        /// `.xlsx`, `.xls` or `.csv` file
        file: PathBuf,
    },
    /// Upsert library codes (code, name, short name)
    LibraryCodes {
        /// `.xlsx`, `.xls` or `.csv` file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { dir } => commands::migrate::run(&dir).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                roles,
                password,
                units,
            } => {
                let request = commands::user::NewUser {
                    email: &email,
                    name: &name,
                    roles: &roles,
                    password: password.as_deref(),
                    units: &units,
                };
                commands::user::create(&request).await?;
            }
        },
        Commands::Import { target } => match target {
            ImportTarget::MasterCodes { file } => {
                commands::import::master_codes(&file).await?;
            }
            ImportTarget::LibraryCodes { file } => {
                commands::import::library_codes(&file).await?;
            }
        },
    }
    Ok(())
}
