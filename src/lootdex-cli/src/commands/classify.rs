//! Obtain classification command handler

use super::{print_json, Indexed};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use lootdex::{
    DropHeuristic, Evidence, ItemId, ItemProfile, ItemRecord, Obtain, ObtainClassifier,
    ObtainMethod, ObtainSource,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct Classified<'a> {
    item: ItemId,
    name: &'a str,
    #[serde(flatten)]
    obtain: Obtain,
}

/// Handle the classify command
///
/// `heuristic` is `None` when the fallback guess should be skipped.
pub fn handle(
    ctx: &Indexed,
    query: Option<&str>,
    heuristic: Option<DropHeuristic>,
    format: OutputFormat,
) -> Result<()> {
    let use_heuristic = heuristic.is_some();
    let classifier = ObtainClassifier::new(ctx.catalog.recipes(), &ctx.loot, &ctx.bags)
        .with_heuristic(heuristic.unwrap_or_default());

    let items: Vec<&ItemRecord> = match query {
        Some(query) => vec![ctx
            .catalog
            .find_item(query)
            .with_context(|| format!("No item matches '{}'", query))?],
        None => ctx.catalog.items().iter().collect(),
    };

    let results: Vec<Classified<'_>> = items
        .into_iter()
        .map(|item| {
            let profile = use_heuristic.then(|| ItemProfile::from(item));
            Classified {
                item: item.id,
                name: &item.name,
                obtain: classifier.classify(item.id, profile.as_ref()),
            }
        })
        .collect();

    if format == OutputFormat::Json {
        return print_json(&results);
    }

    println!(
        "{:<30} {:<13} {:<32} {}",
        "Item", "Method", "Source", "Evidence"
    );
    println!("{}", "-".repeat(88));
    for result in &results {
        println!(
            "{:<30} {:<13} {:<32} {}",
            result.name,
            result.obtain.method.to_string(),
            source_cell(ctx, result.obtain.source),
            evidence_cell(result.obtain.evidence)
        );
    }

    if results.len() > 1 {
        println!();
        for (method, count) in tally(&results) {
            println!("{:<13} {:>6}", method.to_string(), count);
        }
    }

    Ok(())
}

fn source_cell(ctx: &Indexed, source: Option<ObtainSource>) -> String {
    match source {
        Some(ObtainSource::Entity(id)) => ctx.entity_label(id),
        Some(ObtainSource::Container(id)) => ctx.item_label(id),
        None => "-".to_string(),
    }
}

fn evidence_cell(evidence: Evidence) -> &'static str {
    match evidence {
        Evidence::Recipe => "recipe",
        Evidence::ContainerIndex => "bag contents",
        Evidence::LootIndex => "loot table",
        Evidence::Heuristic => "guess (low confidence)",
        Evidence::None => "-",
    }
}

fn tally(results: &[Classified<'_>]) -> BTreeMap<ObtainMethodKey, usize> {
    let mut counts = BTreeMap::new();
    for result in results {
        *counts.entry(ObtainMethodKey(result.obtain.method)).or_insert(0) += 1;
    }
    counts
}

/// Orders methods by how strong their evidence is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ObtainMethodKey(ObtainMethod);

impl ObtainMethodKey {
    fn rank(self) -> u8 {
        match self.0 {
            ObtainMethod::Crafted => 0,
            ObtainMethod::TreasureBag => 1,
            ObtainMethod::MobDrop => 2,
            ObtainMethod::Unknown => 3,
        }
    }
}

impl Ord for ObtainMethodKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for ObtainMethodKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ObtainMethodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    fn classify_all(heuristic: Option<DropHeuristic>) -> Vec<(ItemId, ObtainMethod)> {
        let ctx = fixtures::indexed();
        let classifier = ObtainClassifier::new(ctx.catalog.recipes(), &ctx.loot, &ctx.bags)
            .with_heuristic(heuristic.clone().unwrap_or_default());
        ctx.catalog
            .items()
            .iter()
            .map(|item| {
                let profile = heuristic.as_ref().map(|_| ItemProfile::from(item));
                (item.id, classifier.classify(item.id, profile.as_ref()).method)
            })
            .collect()
    }

    #[test]
    fn test_fixture_classification() {
        let methods: BTreeMap<ItemId, ObtainMethod> =
            classify_all(Some(DropHeuristic::default())).into_iter().collect();

        assert_eq!(methods[&10], ObtainMethod::MobDrop);
        assert_eq!(methods[&12], ObtainMethod::TreasureBag);
        assert_eq!(methods[&14], ObtainMethod::Crafted);
        assert_eq!(methods[&15], ObtainMethod::MobDrop);
        assert_eq!(methods[&16], ObtainMethod::Unknown);
    }

    #[test]
    fn test_without_heuristic_guesses_are_unknown() {
        let methods: BTreeMap<ItemId, ObtainMethod> = classify_all(None).into_iter().collect();
        assert_eq!(methods[&15], ObtainMethod::Unknown);
        assert_eq!(methods[&10], ObtainMethod::MobDrop);
    }

    #[test]
    fn test_tally_order() {
        let results = vec![
            Classified {
                item: 1,
                name: "a",
                obtain: Obtain {
                    method: ObtainMethod::Unknown,
                    source: None,
                    evidence: Evidence::None,
                },
            },
            Classified {
                item: 2,
                name: "b",
                obtain: Obtain {
                    method: ObtainMethod::Crafted,
                    source: None,
                    evidence: Evidence::Recipe,
                },
            },
        ];
        let keys: Vec<ObtainMethod> = tally(&results).into_keys().map(|k| k.0).collect();
        assert_eq!(keys, vec![ObtainMethod::Crafted, ObtainMethod::Unknown]);
    }

    #[test]
    fn test_handle() {
        let ctx = fixtures::indexed();
        let heuristic = Some(DropHeuristic::default());
        assert!(handle(&ctx, Some("Royal Gel"), heuristic, OutputFormat::Table).is_ok());
        assert!(handle(&ctx, None, None, OutputFormat::Json).is_ok());
        assert!(handle(&ctx, Some("Nope"), None, OutputFormat::Table).is_err());
    }
}
