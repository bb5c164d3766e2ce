//! EntiGraph CLI
//!
//! Command-line tools for EntiGraph documents.
//!
//! # Commands
//!
//! - `inspect` - Display entities and their activation status
//! - `edit` - Change one property inside a transaction
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// EntiGraph command-line document tools.
#[derive(Parser)]
#[command(name = "entigraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display entities and their activation status
    Inspect {
        /// Path to the JSON document
        file: PathBuf,

        /// Activate every entity for read before reporting
        #[arg(short, long)]
        activate: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Change one property inside a transaction
    Edit {
        /// Path to the JSON document
        file: PathBuf,

        /// Label of the entity to change
        label: u64,

        /// Property name
        property: String,

        /// New value (JSON, or a plain string)
        value: String,

        /// Roll the transaction back instead of committing
        #[arg(short, long)]
        rollback: bool,

        /// Write the committed document back to the file
        #[arg(short, long, conflicts_with = "rollback")]
        save: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect {
            file,
            activate,
            format,
        } => {
            commands::inspect::run(&file, activate, &format)?;
        }
        Commands::Edit {
            file,
            label,
            property,
            value,
            rollback,
            save,
            format,
        } => {
            let options = commands::edit::EditOptions {
                rollback,
                save,
                format,
            };
            commands::edit::run(&file, label, &property, &value, &options)?;
        }
        Commands::Version => {
            println!("EntiGraph CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("EntiGraph Core v{}", entigraph_core::VERSION);
        }
    }

    Ok(())
}
