//! cli
//!
//! Command-line interface layer for softnav.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! The CLI layer is thin. Navigation itself is driven through
//! [`crate::engine::Controller`] against the in-memory host.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub debug: bool,
    pub quiet: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
    };
    commands::dispatch(cli.command, &ctx)
}

/// `--debug` wins over `RUST_LOG`; the default is `warn`. HTTP internals stay
/// at `warn` either way.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug,hyper=warn,hyper_util=warn,reqwest=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
