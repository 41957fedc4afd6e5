//! check command - Load, validate and print configuration

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cache::MarkerParser;
use crate::cli::Context;
use crate::core::config::Config;

/// Load configuration the way `trace` would and print the resolved values.
///
/// Fails if the file cannot be read or parsed, or if a value is invalid.
pub fn check(ctx: &Context, config: Option<&Path>) -> Result<()> {
    let loaded = Config::load(config).context("Failed to load configuration")?;
    MarkerParser::new(&loaded.config.wrapper_attr)
        .context("wrapper_attr cannot be used as a markup attribute")?;

    if ctx.quiet {
        return Ok(());
    }

    match &loaded.path {
        Some(path) => println!("# source: {}", path.display()),
        None => println!("# source: defaults"),
    }
    let rendered =
        toml::to_string_pretty(&loaded.config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
