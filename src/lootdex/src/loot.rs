//! Entity loot index
//!
//! Resolves every entity's rule list once and keeps two views:
//! entity → resolved drops (forward) and item → entities (reverse).

use crate::catalog::{CatalogError, CatalogProvider};
use crate::resolver::{NameLookup, ResolvedDrop, Resolver};
use crate::rules::{DropRule, EntityId, ItemId};
use std::collections::{HashMap, HashSet};

/// Counters collected while building a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BuildStats {
    /// Ids offered by the catalog
    pub scanned: usize,
    /// Ids that produced at least one outcome
    pub indexed: usize,
    /// Ids the catalog could not materialize
    pub skipped_missing: usize,
    /// Rule nodes recovered from (malformed, unnamed, or truncated)
    pub recovered_nodes: usize,
}

/// Forward and reverse loot indices over the entity catalog
#[derive(Debug, Clone, Default)]
pub struct LootCache {
    /// Indexed entities in catalog order
    order: Vec<EntityId>,
    drops: HashMap<EntityId, Vec<ResolvedDrop>>,
    /// Distinct entities per item, in discovery order
    sources: HashMap<ItemId, Vec<EntityId>>,
    stats: BuildStats,
}

impl LootCache {
    /// Build from a catalog provider's hostile entities
    pub fn from_catalog<P: CatalogProvider + ?Sized>(catalog: &P) -> Self {
        Self::build(
            catalog.entity_ids(),
            |id| catalog.entity_rules(id),
            catalog,
        )
    }

    /// Build from explicit ids and a rule lookup
    ///
    /// Entities are scanned in the order given. Entities whose rules resolve
    /// to nothing are left out of both indices.
    pub fn build<'r, I, F, N>(entity_ids: I, mut lookup: F, names: &N) -> Self
    where
        I: IntoIterator<Item = EntityId>,
        F: FnMut(EntityId) -> Result<&'r [DropRule], CatalogError>,
        N: NameLookup + ?Sized,
    {
        let resolver = Resolver::new(names);
        let mut cache = Self::default();

        for id in entity_ids {
            cache.stats.scanned += 1;

            let rules = match lookup(id) {
                Ok(rules) => rules,
                Err(err) => {
                    tracing::debug!(entity = id, %err, "skipping entity");
                    cache.stats.skipped_missing += 1;
                    continue;
                }
            };
            if rules.is_empty() || cache.drops.contains_key(&id) {
                continue;
            }

            let resolution = resolver.resolve_all(rules);
            cache.stats.recovered_nodes += resolution.issues.len();
            if resolution.drops.is_empty() {
                continue;
            }

            cache.insert(id, resolution.drops);
        }

        debug_assert!(
            cache.is_consistent(),
            "loot reverse index out of sync with forward index"
        );
        tracing::info!(
            entities = cache.count(),
            outcomes = cache.total_outcome_count(),
            items = cache.sources.len(),
            "built loot cache"
        );
        cache
    }

    fn insert(&mut self, id: EntityId, drops: Vec<ResolvedDrop>) {
        let mut seen = HashSet::new();
        for drop in &drops {
            if seen.insert(drop.item_id) {
                self.sources.entry(drop.item_id).or_default().push(id);
            }
        }
        self.order.push(id);
        self.drops.insert(id, drops);
        self.stats.indexed += 1;
    }

    /// Resolved drops of an entity (empty if it has none)
    pub fn drops_of(&self, entity: EntityId) -> &[ResolvedDrop] {
        self.drops.get(&entity).map_or(&[], Vec::as_slice)
    }

    /// Distinct entities dropping `item`, in catalog scan order
    pub fn entities_that_drop(&self, item: ItemId) -> &[EntityId] {
        self.sources.get(&item).map_or(&[], Vec::as_slice)
    }

    /// First entity found dropping `item` in catalog scan order.
    ///
    /// This is not the most common or most likely source; it depends only on
    /// the order the catalog listed entities in.
    pub fn first_entity_that_drops(&self, item: ItemId) -> Option<EntityId> {
        self.entities_that_drop(item).first().copied()
    }

    pub fn drops_item(&self, item: ItemId) -> bool {
        self.sources.contains_key(&item)
    }

    /// Indexed entity ids in catalog order
    pub fn entities(&self) -> &[EntityId] {
        &self.order
    }

    /// Number of entities with at least one drop
    pub fn count(&self) -> usize {
        self.order.len()
    }

    /// Total resolved outcomes across all entities
    pub fn total_outcome_count(&self) -> usize {
        self.drops.values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Every forward outcome has its entity in the reverse index and every
    /// reverse entry points at an entity that drops the item
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self.drops.iter().all(|(entity, drops)| {
            drops
                .iter()
                .all(|d| self.entities_that_drop(d.item_id).contains(entity))
        });
        let reverse_ok = self.sources.iter().all(|(item, entities)| {
            entities
                .iter()
                .all(|e| self.drops_of(*e).iter().any(|d| d.item_id == *item))
        });
        forward_ok && reverse_ok && self.order.len() == self.drops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EntityRecord, ItemRecord};

    fn names() -> HashMap<ItemId, String> {
        [(10, "Gel"), (11, "Slime Staff"), (12, "Royal Gel"), (13, "Lens")]
            .into_iter()
            .map(|(id, n)| (id, n.to_string()))
            .collect()
    }

    fn build(rules: &HashMap<EntityId, Vec<DropRule>>, ids: &[EntityId]) -> LootCache {
        LootCache::build(
            ids.iter().copied(),
            |id| {
                rules
                    .get(&id)
                    .map(Vec::as_slice)
                    .ok_or(CatalogError::MissingEntity(id))
            },
            &names(),
        )
    }

    #[test]
    fn test_slime_king_scenario() {
        const SLIME_KING: EntityId = 50;
        let rules = HashMap::from([(
            SLIME_KING,
            vec![DropRule::one_of(vec![10, 11], 4).chain(DropRule::fixed(12, 1))],
        )]);
        let cache = build(&rules, &[SLIME_KING]);

        let drops = cache.drops_of(SLIME_KING);
        let summary: Vec<(ItemId, f64)> = drops.iter().map(|d| (d.item_id, d.drop_chance)).collect();
        assert_eq!(summary.len(), 3);
        for ((item, chance), (want_item, want_chance)) in
            summary.iter().zip([(10, 0.125), (11, 0.125), (12, 1.0)])
        {
            assert_eq!(*item, want_item);
            assert!((chance - want_chance).abs() < 1e-6);
        }
        assert_eq!(cache.entities_that_drop(10), &[SLIME_KING]);
    }

    #[test]
    fn test_reverse_index_round_trip() {
        let rules = HashMap::from([
            (1, vec![DropRule::fixed(10, 2), DropRule::fixed(13, 3)]),
            (2, vec![DropRule::one_of(vec![10, 11], 1)]),
            (3, vec![DropRule::fixed(12, 1).chain(DropRule::fixed(10, 5))]),
        ]);
        let cache = build(&rules, &[1, 2, 3]);

        for &entity in cache.entities() {
            for drop in cache.drops_of(entity) {
                assert!(cache.entities_that_drop(drop.item_id).contains(&entity));
            }
        }
        assert!(cache.is_consistent());
        assert_eq!(cache.entities_that_drop(10), &[1, 2, 3]);
    }

    #[test]
    fn test_forward_keeps_duplicates_reverse_does_not() {
        let rules = HashMap::from([(
            7,
            vec![DropRule::fixed(10, 2), DropRule::fixed(10, 10)],
        )]);
        let cache = build(&rules, &[7]);
        assert_eq!(cache.drops_of(7).len(), 2);
        assert_eq!(cache.entities_that_drop(10), &[7]);
        assert_eq!(cache.total_outcome_count(), 2);
    }

    #[test]
    fn test_first_entity_follows_scan_order() {
        let rules = HashMap::from([
            (5, vec![DropRule::fixed(10, 50)]),
            (2, vec![DropRule::fixed(10, 1)]),
        ]);
        let cache = build(&rules, &[5, 2]);
        assert_eq!(cache.first_entity_that_drops(10), Some(5));

        let reversed = build(&rules, &[2, 5]);
        assert_eq!(reversed.first_entity_that_drops(10), Some(2));
    }

    #[test]
    fn test_empty_and_missing_entities_are_skipped() {
        let rules = HashMap::from([
            (1, Vec::new()),
            (2, vec![DropRule::one_of(Vec::new(), 1)]),
            (3, vec![DropRule::fixed(99, 1)]),
            (4, vec![DropRule::fixed(13, 1)]),
        ]);
        let cache = build(&rules, &[1, 2, 3, 4, 404]);

        assert_eq!(cache.entities(), &[4]);
        assert!(cache.drops_of(1).is_empty());
        assert!(cache.drops_of(404).is_empty());
        assert!(cache.entities_that_drop(99).is_empty());
        assert_eq!(cache.first_entity_that_drops(99), None);

        let stats = cache.stats();
        assert_eq!(stats.scanned, 5);
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.skipped_missing, 1);
        assert_eq!(stats.recovered_nodes, 1);
    }

    #[test]
    fn test_repeated_ids_are_indexed_once() {
        let rules = HashMap::from([(1, vec![DropRule::fixed(10, 1)])]);
        let cache = build(&rules, &[1, 1]);
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.drops_of(1).len(), 1);
    }

    #[test]
    fn test_slime_king_catalog_without_life() {
        let catalog = Catalog::from_json(
            r#"{
                "items": [
                    { "id": 10, "name": "Gel" },
                    { "id": 11, "name": "Slime Staff" },
                    { "id": 12, "name": "Royal Gel" }
                ],
                "entities": [
                    { "id": 50, "name": "Slime King", "rules": [
                        { "type": "one_of_many", "item_ids": [10, 11], "chance_denominator": 4,
                          "chained": [
                            { "type": "fixed_chance", "item_id": 12, "chance_denominator": 1 }
                          ] }
                    ] }
                ]
            }"#,
        )
        .unwrap();

        let cache = LootCache::from_catalog(&catalog);
        assert_eq!(cache.drops_of(50).len(), 3);
        assert_eq!(cache.entities_that_drop(10), &[50]);
        assert_eq!(cache.entities_that_drop(12), &[50]);
    }

    #[test]
    fn test_is_consistent_detects_drift() {
        let rules = HashMap::from([
            (1, vec![DropRule::fixed(10, 1)]),
            (2, vec![DropRule::fixed(13, 1)]),
        ]);

        let mut missing_reverse = build(&rules, &[1, 2]);
        missing_reverse.sources.remove(&13);
        assert!(!missing_reverse.is_consistent());

        let mut stale_reverse = build(&rules, &[1, 2]);
        stale_reverse.sources.entry(10).or_default().push(2);
        assert!(!stale_reverse.is_consistent());

        let mut unordered = build(&rules, &[1, 2]);
        unordered.order.pop();
        assert!(!unordered.is_consistent());
    }

    #[test]
    fn test_from_catalog() {
        let catalog = Catalog::new(
            vec![
                ItemRecord {
                    id: 10,
                    name: "Gel".to_string(),
                    ..Default::default()
                },
                ItemRecord {
                    id: 13,
                    name: "Lens".to_string(),
                    ..Default::default()
                },
            ],
            vec![
                EntityRecord {
                    id: 1,
                    name: "Blue Slime".to_string(),
                    life: 25,
                    rules: vec![DropRule::fixed(10, 1).stack(1, 2)],
                    ..Default::default()
                },
                EntityRecord {
                    id: 2,
                    name: "Merchant".to_string(),
                    life: 250,
                    town_npc: true,
                    rules: vec![DropRule::fixed(13, 1)],
                    ..Default::default()
                },
            ],
            Vec::new(),
        );

        let cache = LootCache::from_catalog(&catalog);
        assert_eq!(cache.entities(), &[1]);
        assert_eq!(cache.drops_of(1)[0].display_name, "Gel");
        assert!(!cache.drops_item(13));
    }
}
