//! CLI argument definitions for lootdex

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Output format for query commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "lootdex")]
#[command(about = "Static loot table resolver", long_about = None)]
pub struct Cli {
    /// Catalog file (.json, .yaml); falls back to the configured default
    #[arg(long, global = true, env = "LOOTDEX_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Output format: table (default), json
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List everything an entity can drop
    #[command(visible_alias = "d")]
    Drops {
        /// Entity id or name (e.g., "50", "King Slime")
        #[arg(required = true, num_args = 1..)]
        entity: Vec<String>,
    },

    /// List every entity that drops an item, in catalog order
    #[command(visible_alias = "s")]
    Sources {
        /// Item id or name (e.g., "Gel")
        #[arg(required = true, num_args = 1..)]
        item: Vec<String>,
    },

    /// Show treasure bag contents, or every bag mapping when no bag is given
    #[command(visible_alias = "b")]
    Bag {
        /// Container item id or name
        #[arg(num_args = 1..)]
        item: Vec<String>,
    },

    /// Classify how an item is obtained
    #[command(visible_alias = "c")]
    Classify {
        /// Item id or name
        #[arg(num_args = 1.., required_unless_present = "all")]
        item: Vec<String>,

        /// Classify every catalog item
        #[arg(long, conflicts_with = "item")]
        all: bool,

        /// Skip the name/rarity/value fallback guess
        #[arg(long)]
        no_heuristic: bool,
    },

    /// List bosses and how many outcomes each drops
    Bosses {
        /// Only bosses added by this mod (empty string for the base game)
        #[arg(long = "mod", value_name = "NAME")]
        mod_name: Option<String>,
    },

    /// Summarize the catalog and the built indices
    Stats,

    /// Configure default settings
    Configure {
        /// Set the default catalog path
        #[arg(long = "set-catalog", value_name = "PATH")]
        set_catalog: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
