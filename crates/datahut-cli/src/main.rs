//! DataHut CLI - inspect, load and annotate datahut stores

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "datahut")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the store file
    #[arg(short, long, default_value = "./datahut.db")]
    db_path: PathBuf,

    /// Enable verbose logging (includes every SQL statement)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Row counts and store information
    Status,

    /// List the evolved columns and their types
    Schema,

    /// Print stored records as JSON lines
    Dump {
        /// Only records not yet marked processed
        #[arg(short, long)]
        unprocessed: bool,

        /// Order by this field instead of insertion order
        #[arg(short, long)]
        order_by: Option<String>,
    },

    /// Extract records from a JSON lines file, one object per line
    Load {
        /// Path to the JSON lines file
        file: PathBuf,
    },

    /// Mark every record processed
    Complete,

    /// Metadata side table commands
    #[command(subcommand)]
    Meta(MetaCommands),
}

#[derive(Subcommand)]
enum MetaCommands {
    /// Print the JSON value stored under a key
    Get { key: String },

    /// Store a JSON value under a key, replacing any previous value
    Set { key: String, value: String },

    /// List stored keys
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Execute command
    match cli.command {
        Commands::Status => commands::status::execute(cli.db_path)?,
        Commands::Schema => commands::status::schema(cli.db_path)?,
        Commands::Dump {
            unprocessed,
            order_by,
        } => commands::dump::execute(cli.db_path, unprocessed, order_by)?,
        Commands::Load { file } => commands::load::execute(cli.db_path, file)?,
        Commands::Complete => commands::status::complete(cli.db_path)?,
        Commands::Meta(MetaCommands::Get { key }) => commands::meta::get(cli.db_path, &key)?,
        Commands::Meta(MetaCommands::Set { key, value }) => {
            commands::meta::set(cli.db_path, &key, &value)?
        }
        Commands::Meta(MetaCommands::List) => commands::meta::list(cli.db_path)?,
    }

    Ok(())
}
