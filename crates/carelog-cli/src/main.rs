//! Out-of-band operator tools for the carelog archive.
//!
//! Both subcommands expect exclusive access to the affected stores: run
//! them while the service is not taking traffic for those users.

use anyhow::Result;
use carelog_infrastructure::{AttachmentStore, LegacyMigrator, MigrationOutcome, StorageConfig};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "carelog")]
#[command(about = "Carelog maintenance tools", long_about = None)]
struct Cli {
    /// Path to a storage config file (defaults to platform locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert pre-session flat history stores to the session schema
    Migrate {
        /// Migrate a single user instead of every store
        #[arg(long)]
        user: Option<String>,
    },
    /// Remove a user's attachments that are not in the keep set
    Cleanup {
        /// User whose upload namespace to clean
        #[arg(long)]
        user: String,
        /// Relative attachment paths to keep (repeatable)
        #[arg(long = "keep")]
        keep: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StorageConfig::from_file(path)?,
        None => StorageConfig::default_location()?,
    };

    match cli.command {
        Commands::Migrate { user } => {
            let migrator = LegacyMigrator::new(&config.sessions_root);
            let results = match user {
                Some(user_id) => {
                    let outcome = migrator.migrate_user(&user_id)?;
                    vec![(user_id, outcome)]
                }
                None => migrator.migrate_all()?,
            };

            for (user_id, outcome) in results {
                match outcome {
                    MigrationOutcome::NoStore => println!("{}: no store", user_id),
                    MigrationOutcome::Empty => println!("{}: empty store", user_id),
                    MigrationOutcome::AlreadyMigrated => {
                        println!("{}: already in session format", user_id)
                    }
                    MigrationOutcome::Migrated { sessions, messages } => println!(
                        "{}: migrated {} messages into {} sessions",
                        user_id, messages, sessions
                    ),
                }
            }
        }
        Commands::Cleanup { user, keep } => {
            let store = AttachmentStore::new(&config.uploads_root);
            let keep: HashSet<String> = keep.into_iter().collect();
            let deleted = store.cleanup(&user, &keep).await;
            println!("{}: removed {} attachment(s)", user, deleted);
        }
    }

    Ok(())
}
