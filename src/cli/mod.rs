//! Command-line interface
//!
//! Argument parsing with clap, colored output, and one handler per command.

pub mod handlers;
pub mod output;

pub use output::OutputFormatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// File support tickets into the production tracking store
#[derive(Parser, Debug)]
#[command(name = "pipeline-tickets", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Settings file (YAML)
    #[arg(short, long, global = true, env = "TICKETS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of the local ticket store
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Project tickets are filed into, overriding the settings
    #[arg(long, global = true)]
    pub project_id: Option<i64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a ticket
    ///
    /// Opens the submission form unless both a title and a description are
    /// given.
    Submit {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Ticket type (matched case-insensitively)
        #[arg(long = "type")]
        ticket_type: Option<String>,

        /// Ticket priority (matched case-insensitively)
        #[arg(short, long)]
        priority: Option<String>,

        /// Files to attach
        #[arg(short, long, value_delimiter = ',')]
        attach: Vec<PathBuf>,
    },

    /// Show the valid ticket types and priorities
    Schema,

    /// Print the link to a ticket
    Url {
        /// Ticket id
        id: i64,
    },

    /// Raise an unhandled panic with the exception hook installed
    Raise {
        /// Panic message
        message: String,
    },

    /// Show a stored ticket
    Show {
        /// Ticket id
        id: i64,
    },
}
