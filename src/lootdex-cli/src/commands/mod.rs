//! Command handlers
//!
//! Every query command works against an [`Indexed`] catalog: the loaded
//! catalog plus the loot and container caches built from it once.

pub mod bag;
pub mod classify;
pub mod configure;
pub mod drops;
pub mod stats;

use crate::config::Config;
use anyhow::{Context, Result};
use lootdex::{Catalog, ContainerCache, EntityId, ItemId, LootCache};
use serde::Serialize;
use std::path::Path;

/// A loaded catalog with its indices
pub struct Indexed {
    pub catalog: Catalog,
    pub loot: LootCache,
    pub bags: ContainerCache,
}

impl Indexed {
    /// Load the catalog named on the command line, or the configured one
    pub fn open(catalog: Option<&Path>, config: &Config) -> Result<Self> {
        let path = catalog.or_else(|| config.catalog()).context(
            "No catalog given. Pass --catalog PATH or run: lootdex configure --set-catalog PATH",
        )?;
        tracing::debug!(path = %path.display(), "loading catalog");

        let catalog = Catalog::load(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?;

        Ok(Self::build(catalog))
    }

    pub fn build(catalog: Catalog) -> Self {
        let loot = LootCache::from_catalog(&catalog);
        let bags = ContainerCache::from_catalog(&catalog);
        Self {
            catalog,
            loot,
            bags,
        }
    }

    /// Item display name, or `#id` when the catalog has none
    pub fn item_label(&self, id: ItemId) -> String {
        match self.catalog.item(id) {
            Some(item) if !item.name.is_empty() => item.name.clone(),
            _ => format!("#{}", id),
        }
    }

    /// Entity display name, or `#id` when the catalog has none
    pub fn entity_label(&self, id: EntityId) -> String {
        self.catalog
            .entity_name(id)
            .map_or_else(|| format!("#{}", id), str::to_string)
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Join condition tags for a table cell
pub(crate) fn conditions_cell<'a, I: IntoIterator<Item = &'a String>>(tags: I) -> String {
    let joined = tags
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
