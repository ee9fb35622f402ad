//! Container (treasure bag) index
//!
//! Same resolution as the loot cache, but keyed on container items and
//! their item-level rules. The reverse lookup is single-valued: when an item
//! is reachable from several containers, the first container built wins.

use crate::catalog::{CatalogError, CatalogProvider};
use crate::loot::BuildStats;
use crate::resolver::{NameLookup, ResolvedDrop, Resolver};
use crate::rules::{DropRule, ItemId};
use std::collections::{HashMap, HashSet};

/// Container contents with a canonical container per content item
#[derive(Debug, Clone, Default)]
pub struct ContainerCache {
    /// Containers in build order
    order: Vec<ItemId>,
    contents: HashMap<ItemId, Vec<ResolvedDrop>>,
    /// Content item → first container found holding it
    canonical: HashMap<ItemId, ItemId>,
    stats: BuildStats,
}

impl ContainerCache {
    /// Build from every catalog item the provider marks as a container
    pub fn from_catalog<P: CatalogProvider + ?Sized>(catalog: &P) -> Self {
        Self::build(
            catalog.item_ids(),
            |id| catalog.is_container(id),
            |id| catalog.item_rules(id),
            catalog,
        )
    }

    /// Build from explicit item ids, a container predicate and a rule lookup
    pub fn build<'r, I, C, F, N>(item_ids: I, mut is_container: C, mut lookup: F, names: &N) -> Self
    where
        I: IntoIterator<Item = ItemId>,
        C: FnMut(ItemId) -> bool,
        F: FnMut(ItemId) -> Result<&'r [DropRule], CatalogError>,
        N: NameLookup + ?Sized,
    {
        let resolver = Resolver::new(names);
        let mut cache = Self::default();

        for id in item_ids {
            if !is_container(id) {
                continue;
            }
            cache.stats.scanned += 1;

            let rules = match lookup(id) {
                Ok(rules) => rules,
                Err(err) => {
                    tracing::debug!(container = id, %err, "skipping container");
                    cache.stats.skipped_missing += 1;
                    continue;
                }
            };
            if rules.is_empty() || cache.contents.contains_key(&id) {
                continue;
            }

            let resolution = resolver.resolve_all(rules);
            cache.stats.recovered_nodes += resolution.issues.len();
            if resolution.drops.is_empty() {
                continue;
            }

            tracing::debug!(
                container = id,
                items = resolution.drops.len(),
                "found container"
            );
            cache.insert(id, resolution.drops);
        }

        debug_assert!(
            cache.is_consistent(),
            "container reverse index out of sync with forward index"
        );
        tracing::info!(
            containers = cache.count(),
            mappings = cache.mapping_count(),
            "built container cache"
        );
        cache
    }

    fn insert(&mut self, id: ItemId, drops: Vec<ResolvedDrop>) {
        for drop in &drops {
            self.canonical.entry(drop.item_id).or_insert(id);
        }
        self.order.push(id);
        self.contents.insert(id, drops);
        self.stats.indexed += 1;
    }

    /// Resolved contents of a container (empty if unknown)
    pub fn contents_of(&self, container: ItemId) -> &[ResolvedDrop] {
        self.contents.get(&container).map_or(&[], Vec::as_slice)
    }

    /// Canonical container holding `item`
    pub fn container_of(&self, item: ItemId) -> Option<ItemId> {
        self.canonical.get(&item).copied()
    }

    pub fn is_container(&self, item: ItemId) -> bool {
        self.contents.contains_key(&item)
    }

    /// Container ids in build order
    pub fn containers(&self) -> &[ItemId] {
        &self.order
    }

    /// Container → content items it is canonical for, in build order.
    /// Containers that won no items are omitted.
    pub fn mappings(&self) -> Vec<(ItemId, Vec<ItemId>)> {
        self.order
            .iter()
            .filter_map(|&container| {
                let mut seen = HashSet::new();
                let items: Vec<ItemId> = self
                    .contents_of(container)
                    .iter()
                    .map(|d| d.item_id)
                    .filter(|item| self.container_of(*item) == Some(container))
                    .filter(|item| seen.insert(*item))
                    .collect();
                (!items.is_empty()).then_some((container, items))
            })
            .collect()
    }

    /// Number of containers with contents
    pub fn count(&self) -> usize {
        self.order.len()
    }

    /// Number of content items with a canonical container
    pub fn mapping_count(&self) -> usize {
        self.canonical.len()
    }

    pub fn total_outcome_count(&self) -> usize {
        self.contents.values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Every content item maps to a container holding it, and every
    /// mapping points at a container that really holds the item
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self
            .contents
            .values()
            .flatten()
            .all(|d| self.canonical.contains_key(&d.item_id));
        let reverse_ok = self.canonical.iter().all(|(item, container)| {
            self.contents_of(*container)
                .iter()
                .any(|d| d.item_id == *item)
        });
        forward_ok && reverse_ok && self.order.len() == self.contents.len()
    }
}
