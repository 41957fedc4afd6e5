//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! `trace` performs network I/O, so it builds a tokio runtime and blocks on
//! the async implementation. The other commands are synchronous.

mod check;
mod completion;
mod trace;

pub use check::check;
pub use completion::completion;
pub use trace::{trace, TraceOptions};

use super::args::Command;
use super::Context;
use anyhow::Result;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Trace {
            origin,
            paths,
            back,
            transition,
            config,
        } => trace(
            ctx,
            TraceOptions {
                origin,
                paths,
                back,
                transition,
                config,
            },
        ),
        Command::Check { config } => check(ctx, config.as_deref()),
        Command::Completion { shell } => completion(shell),
    }
}
