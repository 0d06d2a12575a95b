use clap::Parser;
use roster_import::cli::commands;
use roster_import::cli::{Cli, Commands};
use roster_import::config;
use roster_import::logging::init_logging;
use roster_import::{RosterError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut overrides = build_cli_overrides(&cli);

    let result = match &cli.command {
        Commands::Init { force } => commands::init::execute(*force, None),
        Commands::Import {
            target,
            file,
            dry_run,
            default_parent,
        } => {
            overrides.default_parent.clone_from(default_parent);
            commands::import::execute(*target, file, *dry_run, cli.json, &overrides)
        }
        Commands::Catalog { kind } => {
            commands::catalog::execute(kind.as_deref(), cli.json, &overrides)
        }
        Commands::List { target } => commands::list::execute(*target, cli.json, &overrides),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &RosterError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        db: cli.db.clone(),
        actor: cli.actor.clone(),
        lock_timeout: cli.lock_timeout,
        default_parent: None,
    }
}
