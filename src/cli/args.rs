//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// softnav - headless driver for the soft navigation engine
#[derive(Parser, Debug)]
#[command(name = "softnav")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a headless session against a live site and print its events
    #[command(
        name = "trace",
        long_about = "Drive a headless navigation session against a live site.\n\n\
            The start page is fetched from ORIGIN and booted as the initial document. \
            Each PATH is then navigated to in order, exactly as a link click would, \
            and every event emitted on the bus is printed. Use --back to replay \
            history entries afterwards.",
        after_help = "\
EXAMPLES:
    # Visit two pages and print the event stream
    softnav trace https://example.com /about /blog

    # Visit, then step back twice through history
    softnav trace https://example.com /a /b --back 2

    # Use a specific transition name for every hop
    softnav trace https://example.com /a --transition fade"
    )]
    Trace {
        /// Start page; its origin bounds every navigation
        origin: String,

        /// Paths to navigate to, in order
        #[arg(required = true)]
        paths: Vec<String>,

        /// Number of history steps to go back after navigating
        #[arg(long, default_value_t = 0)]
        back: usize,

        /// Transition name to request for each navigation
        #[arg(long)]
        transition: Option<String>,

        /// Configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Load, validate and print configuration
    #[command(
        name = "check",
        after_help = "\
Without --config, the first existing file of $SOFTNAV_CONFIG,
$XDG_CONFIG_HOME/softnav/config.toml and ~/.softnav/config.toml is used.
Defaults apply when none exists."
    )]
    Check {
        /// Configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn trace_requires_paths() {
        assert!(Cli::try_parse_from(["softnav", "trace", "https://example.com"]).is_err());
    }

    #[test]
    fn trace_parses_flags() {
        let cli = Cli::try_parse_from([
            "softnav",
            "trace",
            "https://example.com",
            "/a",
            "/b",
            "--back",
            "1",
            "--debug",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Command::Trace { paths, back, .. } => {
                assert_eq!(paths, vec!["/a", "/b"]);
                assert_eq!(back, 1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
