//! Item provenance classification
//!
//! Decision order, first match wins:
//! 1. a recipe produces the item → `Crafted`
//! 2. a container holds it → `TreasureBag` (canonical container)
//! 3. an entity drops it → `MobDrop` (first entity in scan order)
//! 4. the fallback heuristic matches → `MobDrop`, flagged low-confidence
//!
//! Anything else is `Unknown`.

use crate::catalog::{ItemRecord, RecipeIndex};
use crate::container::ContainerCache;
use crate::loot::LootCache;
use crate::rules::{EntityId, ItemId};
use serde::{Deserialize, Serialize};

/// How an item is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObtainMethod {
    #[serde(rename = "crafting")]
    Crafted,
    MobDrop,
    TreasureBag,
    Unknown,
}

impl std::fmt::Display for ObtainMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObtainMethod::Crafted => write!(f, "Crafted"),
            ObtainMethod::MobDrop => write!(f, "Mob Drop"),
            ObtainMethod::TreasureBag => write!(f, "Treasure Bag"),
            ObtainMethod::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Where an obtained item comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ObtainSource {
    Entity(EntityId),
    Container(ItemId),
}

/// What the classification was based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    Recipe,
    ContainerIndex,
    LootIndex,
    /// Name/rarity/value guess with no structural backing
    Heuristic,
    None,
}

/// Classification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obtain {
    pub method: ObtainMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ObtainSource>,
    pub evidence: Evidence,
}

impl Obtain {
    fn new(method: ObtainMethod, source: Option<ObtainSource>, evidence: Evidence) -> Self {
        Self {
            method,
            source,
            evidence,
        }
    }

    /// Derived from the fallback heuristic rather than catalog structure
    pub fn is_low_confidence(&self) -> bool {
        self.evidence == Evidence::Heuristic
    }
}

/// Item attributes read by the fallback heuristic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemProfile {
    pub name: String,
    pub rarity: i32,
    pub damage: i32,
    pub accessory: bool,
    /// Occupies a head, body or leg slot
    pub equip_slot: bool,
    /// Base value in copper coins
    pub value: i64,
}

impl ItemProfile {
    /// Deals damage, is an accessory, or can be worn
    pub fn is_combat_capable(&self) -> bool {
        self.damage > 0 || self.accessory || self.equip_slot
    }

    /// What a shop pays for the item, in copper
    pub fn sale_value(&self) -> i64 {
        self.value / 5
    }
}

impl From<&ItemRecord> for ItemProfile {
    fn from(item: &ItemRecord) -> Self {
        Self {
            name: item.name.clone(),
            rarity: item.rarity,
            damage: item.damage,
            accessory: item.accessory,
            equip_slot: item.is_wearable(),
            value: item.value,
        }
    }
}

/// Thresholds for guessing that an item without structural evidence drops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropHeuristic {
    /// Lowercase name fragments typical of drop rewards
    pub patterns: Vec<String>,
    /// Any item at or above this rarity
    pub rarity_floor: i32,
    /// Combat-capable items at or above this rarity
    pub combat_rarity_floor: i32,
    /// Sale value, in copper, that marks an item as valuable
    pub sale_value_floor: i64,
    /// Minimum rarity for the sale value rule
    pub valuable_rarity_floor: i32,
}

impl Default for DropHeuristic {
    fn default() -> Self {
        let patterns = [
            "banner",
            "trophy",
            "mask",
            "dye",
            "soul",
            "essence",
            "scale",
            "horn",
            "fang",
            "claw",
            "eye",
            "heart",
            "brain",
            "relic",
            "treasure bag",
            "expert",
            "master",
        ];
        Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            rarity_floor: 3,
            combat_rarity_floor: 2,
            // 2 gold
            sale_value_floor: 20_000,
            valuable_rarity_floor: 1,
        }
    }
}

impl DropHeuristic {
    pub fn matches(&self, item: &ItemProfile) -> bool {
        let name = item.name.to_lowercase();
        if self
            .patterns
            .iter()
            .any(|p| !p.is_empty() && name.contains(&p.to_lowercase()))
        {
            return true;
        }

        if item.rarity >= self.rarity_floor {
            return true;
        }

        if item.is_combat_capable() && item.rarity >= self.combat_rarity_floor {
            return true;
        }

        item.sale_value() >= self.sale_value_floor && item.rarity >= self.valuable_rarity_floor
    }
}

/// Assigns provenance to items from recipes, containers and loot tables
pub struct ObtainClassifier<'a, R: ?Sized> {
    recipes: &'a R,
    loot: &'a LootCache,
    containers: &'a ContainerCache,
    heuristic: DropHeuristic,
}

impl<'a, R: RecipeIndex + ?Sized> ObtainClassifier<'a, R> {
    pub fn new(recipes: &'a R, loot: &'a LootCache, containers: &'a ContainerCache) -> Self {
        Self {
            recipes,
            loot,
            containers,
            heuristic: DropHeuristic::default(),
        }
    }

    pub fn with_heuristic(mut self, heuristic: DropHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Classify an item. Without a profile the fallback heuristic is skipped.
    pub fn classify(&self, item: ItemId, profile: Option<&ItemProfile>) -> Obtain {
        if self.recipes.recipe_count(item) > 0 {
            return Obtain::new(ObtainMethod::Crafted, None, Evidence::Recipe);
        }

        if let Some(container) = self.containers.container_of(item) {
            return Obtain::new(
                ObtainMethod::TreasureBag,
                Some(ObtainSource::Container(container)),
                Evidence::ContainerIndex,
            );
        }

        if let Some(entity) = self.loot.first_entity_that_drops(item) {
            return Obtain::new(
                ObtainMethod::MobDrop,
                Some(ObtainSource::Entity(entity)),
                Evidence::LootIndex,
            );
        }

        match profile {
            Some(profile) if self.heuristic.matches(profile) => {
                tracing::debug!(item, name = %profile.name, "classified by heuristic");
                Obtain::new(ObtainMethod::MobDrop, None, Evidence::Heuristic)
            }
            _ => Obtain::new(ObtainMethod::Unknown, None, Evidence::None),
        }
    }
}

/// Classify with the default heuristic
pub fn classify<R: RecipeIndex + ?Sized>(
    item: ItemId,
    recipes: &R,
    loot: &LootCache,
    containers: &ContainerCache,
    profile: Option<&ItemProfile>,
) -> Obtain {
    ObtainClassifier::new(recipes, loot, containers).classify(item, profile)
}
