//! # credreg CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use credreg_cli::keygen::{run_keygen, KeygenArgs};
use credreg_cli::list::{run_blank, run_inspect, run_set, BlankArgs, InspectArgs, SetArgs};

/// Status list operator tool.
///
/// Generates, inspects and edits encoded status lists offline, and
/// generates symmetric keys for encrypted registries.
#[derive(Parser, Debug)]
#[command(name = "credreg", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an all-valid encoded list.
    Blank(BlankArgs),

    /// Decode a list and print the status at an index or a summary.
    Inspect(InspectArgs),

    /// Apply a status code at indices and print the new encoding.
    Set(SetArgs),

    /// Generate a symmetric key, hex encoded.
    Keygen(KeygenArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr so stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Blank(args) => run_blank(&args),
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Set(args) => run_set(&args),
        Commands::Keygen(args) => run_keygen(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_blank_defaults() {
        let cli = Cli::try_parse_from(["credreg", "blank"]).unwrap();
        let Commands::Blank(args) = cli.command else {
            panic!("expected blank");
        };
        assert_eq!(args.shape.size, 131_072);
        assert_eq!(args.shape.status_size, 1);
    }

    #[test]
    fn cli_parse_set_indices() {
        let cli = Cli::try_parse_from([
            "credreg", "set", "--size", "64", "--indices", "3,5,9", "--code", "1", "uABC",
        ])
        .unwrap();
        let Commands::Set(args) = cli.command else {
            panic!("expected set");
        };
        assert_eq!(args.indices, vec![3, 5, 9]);
        assert_eq!(args.source.content.as_deref(), Some("uABC"));
    }

    #[test]
    fn cli_inspect_requires_content() {
        assert!(Cli::try_parse_from(["credreg", "inspect", "--size", "64"]).is_err());
    }

    #[test]
    fn cli_verbose_counts() {
        let cli = Cli::try_parse_from(["credreg", "-vv", "keygen"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
