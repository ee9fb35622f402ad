//! Entity drop and item source command handlers

use super::{conditions_cell, print_json, Indexed};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use lootdex::{EntityId, EntityKind, EntityRecord, GameMode, ItemId, ResolvedDrop};
use serde::Serialize;

#[derive(Serialize)]
struct EntityDrops<'a> {
    entity: EntityId,
    name: &'a str,
    kind: EntityKind,
    /// Difficulty modes the rules branch on; both sides are listed in `drops`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    modes: Vec<GameMode>,
    drops: &'a [ResolvedDrop],
}

#[derive(Serialize)]
struct ItemSources<'a> {
    item: ItemId,
    name: &'a str,
    first_source: Option<EntityId>,
    container: Option<ItemId>,
    sources: Vec<ItemSource<'a>>,
}

#[derive(Serialize)]
struct ItemSource<'a> {
    entity: EntityId,
    name: String,
    kind: Option<EntityKind>,
    mini_boss: bool,
    outcomes: Vec<&'a ResolvedDrop>,
}

/// Handle the drops command
pub fn drops(ctx: &Indexed, query: &str, format: OutputFormat) -> Result<()> {
    let entity = ctx
        .catalog
        .find_entity(query)
        .with_context(|| format!("No entity matches '{}'", query))?;
    let drops = ctx.loot.drops_of(entity.id);
    let modes = branch_modes(entity);

    if format == OutputFormat::Json {
        return print_json(&EntityDrops {
            entity: entity.id,
            name: &entity.name,
            kind: entity.kind(),
            modes,
            drops,
        });
    }

    if drops.is_empty() {
        println!("No drops found for '{}'", entity.name);
        return Ok(());
    }

    println!("Drops from '{}' ({}):", entity.name, entity.kind());
    if !modes.is_empty() {
        let labels: Vec<&str> = modes.iter().map(GameMode::label).collect();
        println!("Varies by {}; every branch is listed", labels.join(", "));
    }
    println!();
    println!(
        "{:<30} {:>6} {:>9} {:>8}  {}",
        "Item", "Id", "Chance", "Stack", "Conditions"
    );
    println!("{}", "-".repeat(72));

    for drop in drops {
        println!(
            "{:<30} {:>6} {:>9} {:>8}  {}",
            drop.display_name,
            drop.item_id,
            drop.chance_display(),
            drop.stack_display(),
            conditions_cell(&drop.condition_tags)
        );
    }

    Ok(())
}

/// Handle the sources command
pub fn sources(ctx: &Indexed, query: &str, format: OutputFormat) -> Result<()> {
    let item = ctx
        .catalog
        .find_item(query)
        .with_context(|| format!("No item matches '{}'", query))?;
    let rows = collect_sources(ctx, item.id);
    let container = ctx.bags.container_of(item.id);

    if format == OutputFormat::Json {
        return print_json(&ItemSources {
            item: item.id,
            name: &item.name,
            first_source: ctx.loot.first_entity_that_drops(item.id),
            container,
            sources: rows,
        });
    }

    if rows.is_empty() {
        println!("No entity drops '{}'", item.name);
        if let Some(bag) = container {
            println!("\nIt comes from '{}'; try 'lootdex bag {}'", ctx.item_label(bag), bag);
        }
        return Ok(());
    }

    println!("Sources of '{}' (catalog order):\n", item.name);
    println!(
        "{:<30} {:<10} {:>9} {:>8}  {}",
        "Entity", "Type", "Chance", "Stack", "Conditions"
    );
    println!("{}", "-".repeat(72));

    for row in &rows {
        let name = if row.mini_boss {
            format!("{} *", row.name)
        } else {
            row.name.clone()
        };
        let kind = row.kind.map_or_else(|| "-".to_string(), |k| k.to_string());
        for outcome in &row.outcomes {
            println!(
                "{:<30} {:<10} {:>9} {:>8}  {}",
                name,
                kind,
                outcome.chance_display(),
                outcome.stack_display(),
                conditions_cell(&outcome.condition_tags)
            );
        }
    }

    println!();
    println!("First source: {}", rows[0].name);
    if let Some(bag) = container {
        println!("Treasure bag: {}", ctx.item_label(bag));
    }
    if rows.iter().any(|r| r.mini_boss) {
        println!("\n* mini-boss");
    }

    Ok(())
}

#[derive(Serialize)]
struct BossRow<'a> {
    entity: EntityId,
    name: &'a str,
    #[serde(rename = "mod", skip_serializing_if = "Option::is_none")]
    mod_name: Option<&'a str>,
    outcomes: usize,
}

fn collect_bosses<'a>(ctx: &'a Indexed, mod_name: Option<&str>) -> Vec<BossRow<'a>> {
    ctx.catalog
        .bosses(mod_name)
        .into_iter()
        .map(|boss| BossRow {
            entity: boss.id,
            name: &boss.name,
            mod_name: (!boss.mod_name.is_empty()).then_some(boss.mod_name.as_str()),
            outcomes: ctx.loot.drops_of(boss.id).len(),
        })
        .collect()
}

/// Handle the bosses command
pub fn bosses(ctx: &Indexed, mod_name: Option<&str>, format: OutputFormat) -> Result<()> {
    let rows = collect_bosses(ctx, mod_name);

    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        match mod_name {
            Some(m) => println!("No bosses found for mod '{}'", m),
            None => println!("No bosses found"),
        }
        return Ok(());
    }

    println!("{:<30} {:>6} {:<20} {:>8}", "Boss", "Id", "Mod", "Outcomes");
    println!("{}", "-".repeat(67));
    for row in &rows {
        println!(
            "{:<30} {:>6} {:<20} {:>8}",
            row.name,
            row.entity,
            row.mod_name.unwrap_or("-"),
            row.outcomes
        );
    }

    Ok(())
}

/// Modes any of the entity's rules branch on, without repeats
fn branch_modes(entity: &EntityRecord) -> Vec<GameMode> {
    let mut modes = Vec::new();
    for mode in entity.rules.iter().flat_map(|r| r.modes()) {
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    modes
}

fn collect_sources(ctx: &Indexed, item: ItemId) -> Vec<ItemSource<'_>> {
    ctx.loot
        .entities_that_drop(item)
        .iter()
        .map(|&entity| {
            let record = ctx.catalog.entity(entity);
            ItemSource {
                entity,
                name: ctx.entity_label(entity),
                kind: record.map(|e| e.kind()),
                mini_boss: record.is_some_and(|e| e.is_mini_boss()),
                outcomes: ctx
                    .loot
                    .drops_of(entity)
                    .iter()
                    .filter(|d| d.item_id == item)
                    .collect(),
            }
        })
        .collect()
}
