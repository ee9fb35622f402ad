//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up lootdex defaults.

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `catalog` - Optional catalog path to set as default
/// * `show` - If true, show current configuration
pub fn handle(catalog: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config)?;
        return Ok(());
    }

    if let Some(path) = catalog {
        set_catalog(&mut config, path)?;
    } else {
        show_usage();
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) -> Result<()> {
    if let Some(path) = config.catalog() {
        println!("Catalog: {}", path.display());
    } else {
        println!("No catalog configured");
    }

    let heuristic = config.heuristic();
    println!(
        "Heuristic: {} patterns, rarity >= {}, combat rarity >= {}, sale value >= {} (rarity >= {}){}",
        heuristic.patterns.len(),
        heuristic.rarity_floor,
        heuristic.combat_rarity_floor,
        heuristic.sale_value_floor,
        heuristic.valuable_rarity_floor,
        if config.heuristic.is_some() {
            ""
        } else {
            " [defaults]"
        }
    );

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }

    Ok(())
}

/// Set the default catalog in configuration
fn set_catalog(config: &mut Config, path: PathBuf) -> Result<()> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Catalog not found at {}", path.display()))?;

    config.set_catalog(path.clone());
    config.save()?;

    println!("Catalog configured: {}", path.display());
    if let Ok(config_path) = Config::config_path() {
        println!("Config saved to: {}", config_path.display());
    }

    Ok(())
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: lootdex configure --set-catalog PATH");
    println!("   or: lootdex configure --show");
    println!();
    println!("Heuristic thresholds can be overridden under [heuristic] in the config file.");
}
