//! Catalog statistics command handler

use super::{print_json, Indexed};
use crate::cli::OutputFormat;
use anyhow::Result;
use lootdex::{BuildStats, EntityKind};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct Summary {
    items: usize,
    entities: usize,
    recipes: usize,
    entity_kinds: BTreeMap<String, usize>,
    mini_bosses: usize,
    loot_entities: usize,
    loot_outcomes: usize,
    loot: BuildStats,
    containers: usize,
    container_items: usize,
    container_outcomes: usize,
    bags: BuildStats,
}

fn summarize(ctx: &Indexed) -> Summary {
    let mut entity_kinds = BTreeMap::new();
    for entity in ctx.catalog.entities() {
        *entity_kinds.entry(kind_label(entity.kind())).or_insert(0) += 1;
    }

    Summary {
        items: ctx.catalog.items().len(),
        entities: ctx.catalog.entities().len(),
        recipes: ctx.catalog.recipes().len(),
        entity_kinds,
        mini_bosses: ctx
            .catalog
            .entities()
            .iter()
            .filter(|e| e.is_mini_boss())
            .count(),
        loot_entities: ctx.loot.count(),
        loot_outcomes: ctx.loot.total_outcome_count(),
        loot: ctx.loot.stats(),
        containers: ctx.bags.count(),
        container_items: ctx.bags.mapping_count(),
        container_outcomes: ctx.bags.total_outcome_count(),
        bags: ctx.bags.stats(),
    }
}

fn kind_label(kind: EntityKind) -> String {
    kind.to_string().to_lowercase()
}

/// Handle the stats command
pub fn handle(ctx: &Indexed, format: OutputFormat) -> Result<()> {
    let summary = summarize(ctx);

    if format == OutputFormat::Json {
        return print_json(&summary);
    }

    println!("Catalog");
    println!("  {:<22} {:>8}", "Items", summary.items);
    println!("  {:<22} {:>8}", "Entities", summary.entities);
    for (kind, count) in &summary.entity_kinds {
        println!("    {:<20} {:>8}", kind, count);
    }
    println!("    {:<20} {:>8}", "(mini-bosses)", summary.mini_bosses);
    println!("  {:<22} {:>8}", "Recipes", summary.recipes);

    println!();
    println!("Loot cache");
    println!("  {:<22} {:>8}", "Entities indexed", summary.loot_entities);
    println!("  {:<22} {:>8}", "Outcomes", summary.loot_outcomes);
    print_build_stats(&summary.loot);

    println!();
    println!("Container cache");
    println!("  {:<22} {:>8}", "Bags indexed", summary.containers);
    println!("  {:<22} {:>8}", "Items mapped", summary.container_items);
    println!("  {:<22} {:>8}", "Outcomes", summary.container_outcomes);
    print_build_stats(&summary.bags);

    Ok(())
}

fn print_build_stats(stats: &BuildStats) {
    println!("  {:<22} {:>8}", "Scanned", stats.scanned);
    if stats.skipped_missing > 0 {
        println!("  {:<22} {:>8}", "Skipped (missing)", stats.skipped_missing);
    }
    if stats.recovered_nodes > 0 {
        println!("  {:<22} {:>8}", "Bad rule nodes", stats.recovered_nodes);
    }
}
