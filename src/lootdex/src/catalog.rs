//! Catalog snapshots
//!
//! A catalog is the host game's item and entity listing with each record's
//! declared drop rules. The caches only see it through [`CatalogProvider`];
//! [`Catalog`] is the serde-backed snapshot format the CLI loads from
//! JSON or YAML.

use crate::resolver::NameLookup;
use crate::rules::{DropRule, EntityId, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Errors from loading or querying a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported catalog format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Entity {0} is not in the catalog")]
    MissingEntity(EntityId),

    #[error("Item {0} is not in the catalog")]
    MissingItem(ItemId),
}

/// Source of ids and rule lists for cache construction
///
/// Ids must be stable for the lifetime of one build. An id with no declared
/// rewards returns an empty rule list; an id that cannot be materialized
/// returns a `Missing*` error and is skipped by the caches.
pub trait CatalogProvider: NameLookup {
    /// Entities to scan for loot, in catalog order
    fn entity_ids(&self) -> Vec<EntityId>;

    /// All items, in catalog order
    fn item_ids(&self) -> Vec<ItemId>;

    fn entity_rules(&self, id: EntityId) -> Result<&[DropRule], CatalogError>;

    fn item_rules(&self, id: ItemId) -> Result<&[DropRule], CatalogError>;

    /// Whether an item is a container (treasure bag) with its own contents
    fn is_container(&self, id: ItemId) -> bool;
}

/// Recipe ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: ItemId,
    #[serde(default = "default_stack")]
    pub stack: u32,
}

/// A crafting recipe producing `result`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub result: ItemId,
    #[serde(default = "default_stack")]
    pub result_stack: u32,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    /// Crafting station tile ids
    #[serde(default)]
    pub stations: Vec<u32>,
}

fn default_stack() -> u32 {
    1
}

/// Recipe presence lookup
pub trait RecipeIndex {
    /// Number of recipes producing `item`
    fn recipe_count(&self, item: ItemId) -> usize;

    fn is_craftable(&self, item: ItemId) -> bool {
        self.recipe_count(item) > 0
    }
}

impl<T> RecipeIndex for HashMap<ItemId, Vec<T>> {
    fn recipe_count(&self, item: ItemId) -> usize {
        self.get(&item).map_or(0, Vec::len)
    }
}

/// Recipes indexed by result item
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    by_result: HashMap<ItemId, Vec<usize>>,
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        let mut by_result: HashMap<ItemId, Vec<usize>> = HashMap::new();
        for (i, recipe) in recipes.iter().enumerate() {
            by_result.entry(recipe.result).or_default().push(i);
        }
        Self { by_result, recipes }
    }

    /// Recipes that produce `item`
    pub fn recipes_for(&self, item: ItemId) -> Vec<&Recipe> {
        self.by_result
            .get(&item)
            .map(|indices| indices.iter().map(|&i| &self.recipes[i]).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl RecipeIndex for RecipeBook {
    fn recipe_count(&self, item: ItemId) -> usize {
        self.by_result.get(&item).map_or(0, Vec::len)
    }
}

/// Item record from the host catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub rarity: i32,
    pub damage: i32,
    pub accessory: bool,
    pub head_slot: Option<i32>,
    pub body_slot: Option<i32>,
    pub leg_slot: Option<i32>,
    /// Base value in copper coins
    pub value: i64,
    /// Host flag marking boss treasure bags
    pub boss_bag: bool,
    /// Rules for what opening this item yields
    pub rules: Vec<DropRule>,
}

impl ItemRecord {
    /// Whether the item occupies an armor slot. Hosts use -1 for "no slot".
    pub fn is_wearable(&self) -> bool {
        [self.head_slot, self.body_slot, self.leg_slot]
            .into_iter()
            .any(|slot| slot.is_some_and(|s| s >= 0))
    }

    /// Treasure bag detection: the host flag, or a bag-like display name
    pub fn is_treasure_bag(&self) -> bool {
        if self.boss_bag {
            return true;
        }
        let name = self.name.to_lowercase();
        name.contains("treasure bag") || name.contains("boss bag")
    }
}

/// Broad entity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Boss,
    TownNpc,
    Critter,
    Elite,
    Mob,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Boss => write!(f, "Boss"),
            EntityKind::TownNpc => write!(f, "Town NPC"),
            EntityKind::Critter => write!(f, "Critter"),
            EntityKind::Elite => write!(f, "Elite"),
            EntityKind::Mob => write!(f, "Mob"),
        }
    }
}

/// Entity (NPC) record from the host catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    /// Content pack that adds the entity; empty for the base game
    #[serde(rename = "mod", skip_serializing_if = "String::is_empty")]
    pub mod_name: String,
    pub life: i32,
    pub damage: i32,
    pub rarity: i32,
    /// Coins dropped on death, in copper
    pub value: i64,
    pub boss: bool,
    pub town_npc: bool,
    pub friendly: bool,
    pub rules: Vec<DropRule>,
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        if self.boss {
            EntityKind::Boss
        } else if self.town_npc {
            EntityKind::TownNpc
        } else if self.friendly {
            EntityKind::Critter
        } else if self.life > 100 && self.damage > 30 {
            EntityKind::Elite
        } else {
            EntityKind::Mob
        }
    }

    /// Tough, rare or valuable non-boss hostiles
    pub fn is_mini_boss(&self) -> bool {
        !self.boss
            && !self.town_npc
            && !self.friendly
            && self.life > 1000
            && (self.rarity > 0 || self.value > 10_000)
    }

    /// Whether the loot cache should scan this entity. Skips unnamed
    /// entities, town NPCs and friendlies.
    pub fn is_loot_source(&self) -> bool {
        !self.name.is_empty() && !self.town_npc && !self.friendly
    }

    /// Whether the entity comes from `mod_name` (case-insensitive)
    pub fn is_from_mod(&self, mod_name: &str) -> bool {
        self.mod_name.eq_ignore_ascii_case(mod_name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    items: Vec<ItemRecord>,
    #[serde(default)]
    entities: Vec<EntityRecord>,
    #[serde(default)]
    recipes: Vec<Recipe>,
}

/// In-memory catalog snapshot
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<ItemRecord>,
    entities: Vec<EntityRecord>,
    recipes: RecipeBook,
    item_index: HashMap<ItemId, usize>,
    entity_index: HashMap<EntityId, usize>,
}

impl Catalog {
    /// Build a catalog from records. Later duplicates of an id are ignored.
    pub fn new(items: Vec<ItemRecord>, entities: Vec<EntityRecord>, recipes: Vec<Recipe>) -> Self {
        let mut item_index = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            item_index.entry(item.id).or_insert(i);
        }
        let mut entity_index = HashMap::new();
        for (i, entity) in entities.iter().enumerate() {
            entity_index.entry(entity.id).or_insert(i);
        }

        Self {
            items,
            entities,
            recipes: RecipeBook::new(recipes),
            item_index,
            entity_index,
        }
    }

    /// Load a snapshot, picking the format from the file extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Self::from_json(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let snapshot: Snapshot = serde_yaml::from_str(content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let catalog = Self::new(snapshot.items, snapshot.entities, snapshot.recipes);
        tracing::info!(
            items = catalog.items.len(),
            entities = catalog.entities.len(),
            recipes = catalog.recipes.len(),
            "loaded catalog snapshot"
        );
        catalog
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.item_index.get(&id).map(|&i| &self.items[i])
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entity_index.get(&id).map(|&i| &self.entities[i])
    }

    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    /// Display name of an entity, if it has one
    pub fn entity_name(&self, id: EntityId) -> Option<&str> {
        self.entity(id)
            .map(|e| e.name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// Find an item by numeric id or case-insensitive name
    pub fn find_item(&self, query: &str) -> Option<&ItemRecord> {
        if let Ok(id) = query.trim().parse::<ItemId>() {
            return self.item(id);
        }
        let query = query.trim().to_lowercase();
        self.items.iter().find(|i| i.name.to_lowercase() == query)
    }

    /// Bosses in catalog order, optionally limited to one mod
    pub fn bosses(&self, mod_name: Option<&str>) -> Vec<&EntityRecord> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(i, e)| self.entity_index.get(&e.id) == Some(i))
            .map(|(_, e)| e)
            .filter(|e| e.boss)
            .filter(|e| mod_name.map_or(true, |m| e.is_from_mod(m)))
            .collect()
    }

    /// Find an entity by numeric id or case-insensitive name
    pub fn find_entity(&self, query: &str) -> Option<&EntityRecord> {
        if let Ok(id) = query.trim().parse::<EntityId>() {
            return self.entity(id);
        }
        let query = query.trim().to_lowercase();
        self.entities
            .iter()
            .find(|e| e.name.to_lowercase() == query)
    }
}

impl NameLookup for Catalog {
    fn item_name(&self, id: ItemId) -> Option<&str> {
        self.item(id)
            .map(|i| i.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

impl CatalogProvider for Catalog {
    fn entity_ids(&self) -> Vec<EntityId> {
        // Judge each id by the record lookups return, so shadowed
        // duplicates never decide whether an id is scanned
        self.entities
            .iter()
            .enumerate()
            .filter(|(i, e)| self.entity_index.get(&e.id) == Some(i))
            .map(|(_, e)| e)
            .filter(|e| e.is_loot_source())
            .map(|e| e.id)
            .collect()
    }

    fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id).collect()
    }

    fn entity_rules(&self, id: EntityId) -> Result<&[DropRule], CatalogError> {
        self.entity(id)
            .map(|e| e.rules.as_slice())
            .ok_or(CatalogError::MissingEntity(id))
    }

    fn item_rules(&self, id: ItemId) -> Result<&[DropRule], CatalogError> {
        self.item(id)
            .map(|i| i.rules.as_slice())
            .ok_or(CatalogError::MissingItem(id))
    }

    fn is_container(&self, id: ItemId) -> bool {
        self.item(id).is_some_and(ItemRecord::is_treasure_bag)
    }
}
