//! pipeline-tickets - support tickets for pipeline tools
//!
//! This is the main entry point for the pipeline-tickets CLI application.
//! It handles command-line argument parsing and dispatches to the
//! appropriate command handlers.

use clap::Parser;
use pipeline_tickets::cli::handlers::{
    GlobalOptions, HandlerContext, SubmitArgs, handle_raise, handle_schema, handle_show,
    handle_submit, handle_url,
};
use pipeline_tickets::cli::{Cli, Commands, OutputFormatter};
use pipeline_tickets::error::{Result, TicketsError};
use std::process;
use tracing_subscriber::EnvFilter;

/// Main entry point for the pipeline-tickets CLI
fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Run the CLI application with the parsed arguments
///
/// # Errors
///
/// Returns any error that occurs during command execution
fn run(cli: Cli, formatter: OutputFormatter) -> Result<()> {
    init_logging(cli.verbose);

    let options = GlobalOptions {
        config: cli.config,
        store: cli.store,
        project_id: cli.project_id,
    };
    let ctx = HandlerContext::new(&options, formatter)?;
    dispatch_command(cli.command, &ctx)
}

/// Log to stderr when `--verbose` is given or `RUST_LOG` is set
fn init_logging(verbose: bool) {
    let filter = if verbose {
        Some(EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().ok()
    };
    if let Some(filter) = filter {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn dispatch_command(command: Commands, ctx: &HandlerContext) -> Result<()> {
    match command {
        Commands::Submit {
            title,
            description,
            ticket_type,
            priority,
            attach,
        } => handle_submit(
            SubmitArgs {
                title,
                description,
                ticket_type,
                priority,
                attach,
            },
            ctx,
        ),
        Commands::Schema => handle_schema(ctx),
        Commands::Url { id } => handle_url(id, ctx),
        Commands::Raise { message } => handle_raise(message, ctx),
        Commands::Show { id } => handle_show(id, ctx),
    }
}

/// Handle errors and display them to the user
///
/// Prints the message and any suggestions, as JSON in JSON mode, and the
/// full error in debug mode.
fn handle_error(error: &TicketsError, formatter: &OutputFormatter) {
    let suggestions = error.suggestions();

    if formatter.is_json() {
        let _ = formatter.print_json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
        return;
    }

    formatter.error(&error.user_message());
    if !suggestions.is_empty() {
        formatter.info("\nSuggestions:");
        for suggestion in &suggestions {
            formatter.info(&format!("  • {suggestion}"));
        }
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let _cli = Cli::parse_from(["pipeline-tickets", "schema"]);
        let _cli = Cli::parse_from(["pipeline-tickets", "raise", "boom"]);
        let _cli = Cli::parse_from(["pipeline-tickets", "show", "3"]);
    }
}
