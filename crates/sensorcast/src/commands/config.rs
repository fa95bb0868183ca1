//! Config command - configuration management.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML, defaults included
    Show,

    /// Show which config files were checked and which were loaded
    Which,

    /// Show the user configuration file path
    Path,

    /// Check the configuration and exit non-zero if it is invalid
    Validate,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::Validate => cmd_validate(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    print!("{}", ctx.loaded.config.effective().to_toml()?);
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    if ctx.loaded.sources.is_empty() {
        println!("No config files checked");
    }
    for source in &ctx.loaded.sources {
        let marker = if source.loaded { "loaded" } else { "skipped" };
        println!("{:<10} {}", marker, source.path.display());
    }
    for warning in &ctx.loaded.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

fn cmd_path() -> Result<()> {
    match sensorcast_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => anyhow::bail!("could not determine a user config directory"),
    }
    Ok(())
}

fn cmd_validate(ctx: &Context) -> Result<()> {
    ctx.loaded.config.validate()?;
    println!("Configuration is valid");
    if ctx.verbose {
        for path in ctx.loaded.loaded_from() {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
