#![allow(clippy::print_stdout, clippy::needless_pass_by_value)]

mod args;
mod handlers;
mod model;

use crate::args::{Cli, Command};
use anyhow::{Context, Result};
use clap::Parser;
use osprofiles::{ProfileRegistry, ProfilesConfig, load_config};
use osprofiles_logger::{LevelFilter, Logger, level_from_verbosity};
use std::str::FromStr;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(driver) = cli.driver {
        config.driver = driver;
    }
    if let Some(directory) = cli.directory.clone() {
        config.directory = Some(directory);
    }

    let _logger = init_logger(&config, cli.verbose)?;
    let mut registry = ProfileRegistry::from_config(&config)
        .with_context(|| format!("opening profiles for namespace `{}`", config.namespace))?;

    match cli.command {
        Command::Add { name, endpoint, api_key, default } => {
            handlers::add(&mut registry, name, endpoint, api_key, default)?;
        },
        Command::Show { name, reveal } => handlers::show(&registry, name.as_deref(), reveal)?,
        Command::List {} => handlers::list(&registry),
        Command::Use { name } => handlers::use_profile(&mut registry, &name)?,
        Command::Remove { name } => handlers::remove(&mut registry, &name)?,
        Command::Purge { yes } => handlers::purge(&mut registry, yes)?,
        Command::Report {} => handlers::report()?,
    }

    Ok(())
}

fn init_logger(config: &ProfilesConfig, verbose: u8) -> Result<Logger> {
    let level = if verbose > 0 {
        level_from_verbosity(verbose)
    } else {
        LevelFilter::from_str(&config.log.level)
            .with_context(|| format!("invalid log level `{}`", config.log.level))?
    };

    let builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level);
    let logger = match &config.log.directory {
        Some(directory) => builder.path(directory).json(config.log.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}
