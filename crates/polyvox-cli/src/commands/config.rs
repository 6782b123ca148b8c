use std::path::Path;

use console::style;

use crate::config::{Config, CONFIG_KEYS};
use crate::error::{CliError, Result};
use crate::style::Theme;
use crate::ConfigCommands;

pub async fn execute(command: ConfigCommands, config_path: &Path, theme: &Theme) -> Result<()> {
    match command {
        ConfigCommands::Show => show_config(config_path, theme),
        ConfigCommands::Get { key } => get_config(config_path, &key),
        ConfigCommands::Set { key, value } => set_config(config_path, &key, &value, theme),
        ConfigCommands::Reset { yes } => reset_config(config_path, yes, theme).await,
        ConfigCommands::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

fn show_config(path: &Path, theme: &Theme) -> Result<()> {
    if !path.exists() {
        theme.info("No configuration file found. Using defaults.");
    }
    let config = Config::load(path)?;

    println!("{}", style("Configuration:").bold());
    println!("  Path: {}", path.display());
    println!();
    for key in CONFIG_KEYS {
        match config.get(key)? {
            Some(value) => println!("  {key} = \"{value}\""),
            None => println!("  {key} = {}", style("(default)").dim()),
        }
    }
    Ok(())
}

fn get_config(path: &Path, key: &str) -> Result<()> {
    match Config::load(path)?.get(key)? {
        Some(value) => println!("{key} = {value}"),
        None => println!("{key} not set (using default)"),
    }
    Ok(())
}

fn set_config(path: &Path, key: &str, value: &str, theme: &Theme) -> Result<()> {
    let mut config = Config::load(path)?;
    config.set(key, value)?;
    config.save(path)?;
    theme.success(&format!("Set {} = {}", key, value.trim()));
    Ok(())
}

async fn reset_config(path: &Path, yes: bool, theme: &Theme) -> Result<()> {
    if !yes {
        println!("This will delete your configuration file.");
        let confirm = dialoguer::Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()
            .map_err(|e| CliError::Other(e.to_string()))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if path.exists() {
        tokio::fs::remove_file(path).await?;
    }

    theme.success("Configuration reset to defaults");
    Ok(())
}
