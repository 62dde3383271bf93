//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use osprofiles::store::DriverKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "osprofiles")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Manage connection profiles stored with OS keyring protection")]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML); `OSPROFILES__*` variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend, overriding the configuration
    #[arg(long, global = true, value_parser = parse_driver)]
    pub driver: Option<DriverKind>,

    /// Storage directory, overriding the configuration
    #[arg(long, global = true)]
    pub directory: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a new profile
    Add {
        name: String,
        #[arg(long)]
        endpoint: String,
        /// Secret kept encrypted at rest
        #[arg(long)]
        api_key: String,
        /// Make it the default profile
        #[arg(long)]
        default: bool,
    },
    /// Print a profile as JSON (the default profile when no name is given)
    Show {
        name: Option<String>,
        /// Print secure fields instead of masking them
        #[arg(long)]
        reveal: bool,
    },
    /// List profile names, marking the default
    List {},
    /// Set the default profile
    Use { name: String },
    /// Delete a profile and its encryption key
    Remove {
        name: String,
    },
    /// Delete every profile in the namespace
    Purge {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Print the field classification report of the profile type
    Report {},
}

fn parse_driver(raw: &str) -> Result<DriverKind, String> {
    raw.parse().map_err(|e: osprofiles::store::StoreError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_overrides_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["osprofiles", "list", "--driver", "memory", "-vv"]).unwrap();
        assert_eq!(cli.driver, Some(DriverKind::Memory));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::List {}));
    }

    #[test]
    fn test_unknown_driver_is_rejected() {
        assert!(Cli::try_parse_from(["osprofiles", "--driver", "cloud", "list"]).is_err());
    }
}
