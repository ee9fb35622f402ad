//! # lootdex
//!
//! Static loot resolution over a game's item and entity catalog.
//!
//! This library provides functionality to:
//! - Model declarative drop rules (fixed, conditional, one-of-many, mode branches)
//! - Flatten rule trees into resolved (item, chance, stack range) outcomes
//! - Index which entities drop which items, and what treasure bags contain
//! - Classify how each item is obtained (crafted, mob drop, treasure bag)
//!
//! Nothing here rolls dice. Every declared possibility is surfaced,
//! including both sides of difficulty-mode branches.
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lootdex::{Catalog, ContainerCache, LootCache, ObtainClassifier};
//!
//! let catalog = Catalog::load("catalog.json")?;
//! let loot = LootCache::from_catalog(&catalog);
//! let bags = ContainerCache::from_catalog(&catalog);
//!
//! for drop in loot.drops_of(50) {
//!     println!("{} {}", drop.display_name, drop.chance_display());
//! }
//!
//! let classifier = ObtainClassifier::new(catalog.recipes(), &loot, &bags);
//! println!("{}", classifier.classify(2430, None).method);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod container;
pub mod loot;
pub mod obtain;
pub mod resolver;
pub mod rules;

#[doc(inline)]
pub use catalog::{
    Catalog, CatalogError, CatalogProvider, EntityKind, EntityRecord, Ingredient, ItemRecord,
    Recipe, RecipeBook, RecipeIndex,
};
#[doc(inline)]
pub use container::ContainerCache;
#[doc(inline)]
pub use loot::{BuildStats, LootCache};
#[doc(inline)]
pub use obtain::{
    classify, DropHeuristic, Evidence, ItemProfile, Obtain, ObtainClassifier, ObtainMethod,
    ObtainSource,
};
#[doc(inline)]
pub use resolver::{
    resolve, NameLookup, Resolution, ResolvedDrop, Resolver, RuleError, MAX_RULE_NODES,
};
#[doc(inline)]
pub use rules::{DropRule, EntityId, GameMode, ItemId, RuleKind, NO_ITEM};
