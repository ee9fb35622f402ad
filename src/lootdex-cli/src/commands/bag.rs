//! Treasure bag command handler

use super::{conditions_cell, print_json, Indexed};
use crate::cli::OutputFormat;
use anyhow::{bail, Context, Result};
use lootdex::{ItemId, ResolvedDrop};
use serde::Serialize;

#[derive(Serialize)]
struct BagContents<'a> {
    container: ItemId,
    name: &'a str,
    contents: &'a [ResolvedDrop],
}

#[derive(Serialize)]
struct BagMapping {
    container: ItemId,
    name: String,
    items: Vec<ItemId>,
}

/// Handle the bag command
pub fn handle(ctx: &Indexed, query: Option<&str>, format: OutputFormat) -> Result<()> {
    match query {
        Some(query) => contents(ctx, query, format),
        None => mappings(ctx, format),
    }
}

fn contents(ctx: &Indexed, query: &str, format: OutputFormat) -> Result<()> {
    let item = ctx
        .catalog
        .find_item(query)
        .with_context(|| format!("No item matches '{}'", query))?;

    if !ctx.bags.is_container(item.id) {
        bail!("'{}' is not a treasure bag with contents", item.name);
    }
    let contents = ctx.bags.contents_of(item.id);

    if format == OutputFormat::Json {
        return print_json(&BagContents {
            container: item.id,
            name: &item.name,
            contents,
        });
    }

    println!("Contents of '{}':\n", item.name);
    println!(
        "{:<30} {:>6} {:>9} {:>8}  {}",
        "Item", "Id", "Chance", "Stack", "Conditions"
    );
    println!("{}", "-".repeat(72));

    for drop in contents {
        // Items another bag was indexed for first are marked
        let shared = ctx.bags.container_of(drop.item_id) != Some(item.id);
        println!(
            "{:<30} {:>6} {:>9} {:>8}  {}{}",
            drop.display_name,
            drop.item_id,
            drop.chance_display(),
            drop.stack_display(),
            conditions_cell(&drop.condition_tags),
            if shared { " (also elsewhere)" } else { "" }
        );
    }

    Ok(())
}

fn mappings(ctx: &Indexed, format: OutputFormat) -> Result<()> {
    let rows: Vec<BagMapping> = ctx
        .bags
        .mappings()
        .into_iter()
        .map(|(container, items)| BagMapping {
            container,
            name: ctx.item_label(container),
            items,
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No treasure bags found");
        return Ok(());
    }

    println!(
        "Known treasure bags ({}, {} items):\n",
        ctx.bags.count(),
        ctx.bags.mapping_count()
    );
    for row in &rows {
        println!("{} [{}]", row.name, row.container);
        for item in &row.items {
            println!("  {}", ctx.item_label(*item));
        }
    }

    Ok(())
}
