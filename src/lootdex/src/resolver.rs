//! Drop rule resolution
//!
//! Flattens a [`DropRule`] tree into resolved outcomes: concrete
//! (item, chance, stack range) triples. Resolution is depth-first and
//! pre-order: a node's own outcomes come first, then each chained rule's
//! outcomes in declaration order. `ModeBranch` nodes resolve both branches.
//!
//! Resolution never fails as a whole. Bad nodes are recovered locally and
//! reported through [`Resolution::issues`].

use crate::rules::{DropRule, ItemId, RuleKind, NO_ITEM};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Maximum number of rule nodes visited while resolving one root rule list
pub const MAX_RULE_NODES: usize = 1024;

/// Display-name lookup for items
///
/// Outcomes whose item has no name are dropped from resolution output.
pub trait NameLookup {
    /// Display name for `id`, or `None` if the item is unnamed or unknown
    fn item_name(&self, id: ItemId) -> Option<&str>;
}

impl NameLookup for HashMap<ItemId, String> {
    fn item_name(&self, id: ItemId) -> Option<&str> {
        self.get(&id).map(String::as_str).filter(|n| !n.is_empty())
    }
}

impl<T: NameLookup + ?Sized> NameLookup for &T {
    fn item_name(&self, id: ItemId) -> Option<&str> {
        (**self).item_name(id)
    }
}

/// A flattened drop outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDrop {
    pub item_id: ItemId,
    pub display_name: String,
    /// Probability in (0, 1]
    pub drop_chance: f64,
    pub min_stack: u32,
    pub max_stack: u32,
    /// Descriptive conditions (never evaluated)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub condition_tags: BTreeSet<String>,
}

impl ResolvedDrop {
    /// Chance formatted as a percentage (e.g., "12.50%")
    pub fn chance_display(&self) -> String {
        format!("{:.2}%", self.drop_chance * 100.0)
    }

    /// Stack range formatted as "N" or "N-M"
    pub fn stack_display(&self) -> String {
        if self.min_stack == self.max_stack {
            self.min_stack.to_string()
        } else {
            format!("{}-{}", self.min_stack, self.max_stack)
        }
    }
}

/// Problems recovered from during resolution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("Malformed {kind} rule: {reason}")]
    MalformedRuleNode { kind: &'static str, reason: String },

    #[error("Rule graph exceeded {ceiling} nodes; resolution truncated")]
    CyclicRuleGraph { ceiling: usize },

    #[error("Item {0} has no display name")]
    UnnamedItem(ItemId),
}

/// Outcome of resolving a rule tree, with any recovered issues
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub drops: Vec<ResolvedDrop>,
    pub issues: Vec<RuleError>,
}

impl Resolution {
    /// True when nothing had to be recovered
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when the node ceiling cut resolution short
    pub fn is_truncated(&self) -> bool {
        self.issues
            .iter()
            .any(|e| matches!(e, RuleError::CyclicRuleGraph { .. }))
    }
}

/// Resolve a single rule tree, discarding diagnostics
pub fn resolve<N: NameLookup + ?Sized>(rule: &DropRule, names: &N) -> Vec<ResolvedDrop> {
    Resolver::new(names).resolve(rule)
}

/// Rule resolver bound to a name lookup
pub struct Resolver<'n, N: ?Sized> {
    names: &'n N,
    ceiling: usize,
}

impl<'n, N: NameLookup + ?Sized> Resolver<'n, N> {
    pub fn new(names: &'n N) -> Self {
        Self {
            names,
            ceiling: MAX_RULE_NODES,
        }
    }

    /// Override the visited-node ceiling
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn resolve(&self, rule: &DropRule) -> Vec<ResolvedDrop> {
        self.resolve_detailed(rule).drops
    }

    pub fn resolve_detailed(&self, rule: &DropRule) -> Resolution {
        self.resolve_all(std::slice::from_ref(rule))
    }

    /// Resolve a list of root rules in order, sharing one node budget
    pub fn resolve_all(&self, rules: &[DropRule]) -> Resolution {
        let mut walk = Walk {
            names: self.names,
            ceiling: self.ceiling,
            visited: 0,
            truncated: false,
            out: Resolution::default(),
        };
        for rule in rules {
            walk.visit(rule);
        }
        walk.out
    }
}

/// Per-node outcome before name resolution
struct Candidate<'r> {
    item_id: ItemId,
    chance: f64,
    min_stack: u32,
    max_stack: u32,
    condition: Option<&'r str>,
}

struct Walk<'a, N: ?Sized> {
    names: &'a N,
    ceiling: usize,
    visited: usize,
    truncated: bool,
    out: Resolution,
}

impl<N: NameLookup + ?Sized> Walk<'_, N> {
    fn visit(&mut self, rule: &DropRule) {
        if self.truncated {
            return;
        }
        if self.visited >= self.ceiling {
            tracing::warn!(ceiling = self.ceiling, "rule graph exceeded node ceiling; truncating");
            self.truncated = true;
            self.out.issues.push(RuleError::CyclicRuleGraph {
                ceiling: self.ceiling,
            });
            return;
        }
        self.visited += 1;

        match &rule.kind {
            RuleKind::ModeBranch {
                primary, alternate, ..
            } => {
                self.visit(primary);
                self.visit(alternate);
            }
            kind => match node_candidates(kind) {
                Ok(candidates) => {
                    for candidate in candidates {
                        self.push(candidate);
                    }
                }
                Err(err) => {
                    tracing::debug!(%err, "skipping rule node");
                    self.out.issues.push(err);
                }
            },
        }

        for chained in &rule.chained {
            self.visit(chained);
        }
    }

    fn push(&mut self, candidate: Candidate<'_>) {
        let Some(name) = self.names.item_name(candidate.item_id) else {
            tracing::debug!(item_id = candidate.item_id, "dropping outcome for unnamed item");
            self.out
                .issues
                .push(RuleError::UnnamedItem(candidate.item_id));
            return;
        };

        self.out.drops.push(ResolvedDrop {
            item_id: candidate.item_id,
            display_name: name.to_string(),
            drop_chance: candidate.chance,
            min_stack: candidate.min_stack,
            max_stack: candidate.max_stack,
            condition_tags: candidate
                .condition
                .map(|c| BTreeSet::from([c.to_string()]))
                .unwrap_or_default(),
        });
    }
}

/// Chance for a single-item node. Non-positive denominators mean "always".
fn single_chance(denominator: i32) -> f64 {
    if denominator <= 0 {
        1.0
    } else {
        1.0 / f64::from(denominator)
    }
}

fn malformed(kind: &RuleKind, reason: impl Into<String>) -> RuleError {
    RuleError::MalformedRuleNode {
        kind: kind.name(),
        reason: reason.into(),
    }
}

fn check_single(kind: &RuleKind, item_id: ItemId, min: u32, max: u32) -> Result<(), RuleError> {
    if item_id == NO_ITEM {
        return Err(malformed(kind, "references the empty item id"));
    }
    if min > max {
        return Err(malformed(
            kind,
            format!("stack range {}..{} is inverted", min, max),
        ));
    }
    Ok(())
}

/// Outcomes a node contributes on its own, ignoring chained rules
fn node_candidates(kind: &RuleKind) -> Result<Vec<Candidate<'_>>, RuleError> {
    match kind {
        RuleKind::FixedChance {
            item_id,
            chance_denominator,
            min_stack,
            max_stack,
        } => {
            check_single(kind, *item_id, *min_stack, *max_stack)?;
            Ok(vec![Candidate {
                item_id: *item_id,
                chance: single_chance(*chance_denominator),
                min_stack: *min_stack,
                max_stack: *max_stack,
                condition: None,
            }])
        }

        RuleKind::ConditionalChance {
            item_id,
            chance_denominator,
            min_stack,
            max_stack,
            condition,
        } => {
            check_single(kind, *item_id, *min_stack, *max_stack)?;
            Ok(vec![Candidate {
                item_id: *item_id,
                chance: single_chance(*chance_denominator),
                min_stack: *min_stack,
                max_stack: *max_stack,
                condition: Some(condition.as_str()).filter(|c| !c.is_empty()),
            }])
        }

        RuleKind::OneOfMany {
            item_ids,
            chance_denominator,
            stacks_are_unit,
            min_stack,
            max_stack,
        } => {
            if item_ids.is_empty() {
                return Ok(Vec::new());
            }
            if *chance_denominator <= 0 {
                return Err(malformed(
                    kind,
                    format!("chance denominator {} is not positive", chance_denominator),
                ));
            }
            if item_ids.contains(&NO_ITEM) {
                return Err(malformed(kind, "options include the empty item id"));
            }
            let (min, max) = if *stacks_are_unit {
                (1, 1)
            } else {
                (*min_stack, *max_stack)
            };
            if min > max {
                return Err(malformed(
                    kind,
                    format!("stack range {}..{} is inverted", min, max),
                ));
            }

            let chance = 1.0 / (f64::from(*chance_denominator) * item_ids.len() as f64);
            Ok(item_ids
                .iter()
                .map(|&item_id| Candidate {
                    item_id,
                    chance,
                    min_stack: min,
                    max_stack: max,
                    condition: None,
                })
                .collect())
        }

        // Branches are walked by the caller
        RuleKind::ModeBranch { .. } => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::GameMode;

    const EPSILON: f64 = 1e-6;

    fn names() -> HashMap<ItemId, String> {
        (1..=60).map(|id| (id, format!("Item {}", id))).collect()
    }

    fn ids(drops: &[ResolvedDrop]) -> Vec<ItemId> {
        drops.iter().map(|d| d.item_id).collect()
    }

    #[test]
    fn test_fixed_chance_is_reciprocal() {
        let names = names();
        for d in [1, 2, 3, 7, 50] {
            let drops = resolve(&DropRule::fixed(1, d), &names);
            assert_eq!(drops.len(), 1);
            assert!((drops[0].drop_chance - 1.0 / f64::from(d)).abs() < EPSILON);
        }
    }

    #[test]
    fn test_non_positive_denominator_means_always() {
        let names = names();
        for d in [0, -4] {
            let drops = resolve(&DropRule::fixed(1, d), &names);
            assert_eq!(drops.len(), 1);
            assert_eq!(drops[0].drop_chance, 1.0);
        }
    }

    #[test]
    fn test_one_of_many_splits_chance() {
        let names = names();
        let drops = resolve(&DropRule::one_of(vec![1, 2, 3], 5), &names);
        assert_eq!(ids(&drops), vec![1, 2, 3]);

        let total: f64 = drops.iter().map(|d| d.drop_chance).sum();
        assert!((total - 0.2).abs() < EPSILON);
        for drop in &drops {
            assert!((drop.drop_chance - 1.0 / 15.0).abs() < EPSILON);
            assert_eq!((drop.min_stack, drop.max_stack), (1, 1));
        }
    }

    #[test]
    fn test_one_of_many_variable_stacks() {
        let names = names();
        let rule = DropRule::one_of(vec![1, 2], 1).stack(3, 6).variable_stacks();
        let drops = resolve(&rule, &names);
        assert!(drops.iter().all(|d| d.min_stack == 3 && d.max_stack == 6));

        let unit = DropRule::one_of(vec![1, 2], 1).stack(3, 6);
        let drops = resolve(&unit, &names);
        assert!(drops.iter().all(|d| d.min_stack == 1 && d.max_stack == 1));
    }

    #[test]
    fn test_empty_one_of_many_still_resolves_chain() {
        let names = names();
        let rule = DropRule::one_of(Vec::new(), 2).chain(DropRule::fixed(9, 4));
        let res = Resolver::new(&names).resolve_detailed(&rule);
        assert!(res.is_clean());
        assert_eq!(ids(&res.drops), vec![9]);
        assert!((res.drops[0].drop_chance - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_chained_chance_ignores_parent() {
        let names = names();
        let rule = DropRule::fixed(1, 100).chain(DropRule::fixed(2, 2));
        let drops = resolve(&rule, &names);
        assert_eq!(ids(&drops), vec![1, 2]);
        assert!((drops[1].drop_chance - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_mode_branch_resolves_both_branches() {
        let names = names();
        let primary = DropRule::one_of(vec![1, 2], 1);
        let alternate = DropRule::fixed(3, 1).chain(DropRule::fixed(4, 2));
        let rule = DropRule::mode(GameMode::Expert, primary.clone(), alternate.clone());

        let drops = resolve(&rule, &names);
        let mut expected = resolve(&primary, &names);
        expected.extend(resolve(&alternate, &names));
        assert_eq!(drops, expected);
        assert_eq!(drops.len(), 4);
    }

    #[test]
    fn test_mode_branch_keeps_shared_items_twice() {
        let names = names();
        let rule = DropRule::mode(GameMode::Master, DropRule::fixed(7, 2), DropRule::fixed(7, 1));
        let drops = resolve(&rule, &names);
        assert_eq!(ids(&drops), vec![7, 7]);
    }

    #[test]
    fn test_condition_tags() {
        let names = names();
        let drops = resolve(&DropRule::conditional(5, 3, "Not Expert"), &names);
        assert_eq!(drops.len(), 1);
        assert!(drops[0].condition_tags.contains("Not Expert"));
        assert!((drops[0].drop_chance - 1.0 / 3.0).abs() < EPSILON);

        let untagged = resolve(&DropRule::fixed(5, 3), &names);
        assert!(untagged[0].condition_tags.is_empty());
    }

    #[test]
    fn test_unnamed_items_are_dropped() {
        let mut names = names();
        names.insert(2, String::new());
        names.remove(&3);

        let rule = DropRule::one_of(vec![1, 2, 3], 1).chain(DropRule::fixed(4, 1));
        let res = Resolver::new(&names).resolve_detailed(&rule);
        assert_eq!(ids(&res.drops), vec![1, 4]);
        assert_eq!(
            res.issues,
            vec![RuleError::UnnamedItem(2), RuleError::UnnamedItem(3)]
        );
    }

    #[test]
    fn test_malformed_nodes_recover_locally() {
        let names = names();
        let rule = DropRule::fixed(NO_ITEM, 1)
            .chain(DropRule::fixed(1, 1).stack(5, 2))
            .chain(DropRule::one_of(vec![2, 3], 0))
            .chain(DropRule::fixed(4, 1));

        let res = Resolver::new(&names).resolve_detailed(&rule);
        assert_eq!(ids(&res.drops), vec![4]);
        assert_eq!(res.issues.len(), 3);
        assert!(res
            .issues
            .iter()
            .all(|e| matches!(e, RuleError::MalformedRuleNode { .. })));
        assert!(!res.is_truncated());
    }

    #[test]
    fn test_deep_chain_is_truncated_at_ceiling() {
        let names = names();
        let mut rule = DropRule::fixed(1, 1);
        for _ in 0..MAX_RULE_NODES + 50 {
            rule = DropRule::fixed(1, 1).chain(rule);
        }

        let res = Resolver::new(&names).resolve_detailed(&rule);
        assert_eq!(res.drops.len(), MAX_RULE_NODES);
        assert!(res.is_truncated());
        assert_eq!(
            res.issues,
            vec![RuleError::CyclicRuleGraph {
                ceiling: MAX_RULE_NODES
            }]
        );
    }

    #[test]
    fn test_ceiling_is_shared_across_roots() {
        let names = names();
        let rules: Vec<DropRule> = (1..=10).map(|id| DropRule::fixed(id, 1)).collect();
        let res = Resolver::new(&names).with_ceiling(4).resolve_all(&rules);
        assert_eq!(ids(&res.drops), vec![1, 2, 3, 4]);
        assert!(res.is_truncated());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let names = names();
        let rule = DropRule::mode(
            GameMode::Expert,
            DropRule::one_of(vec![10, 11, 12], 3).chain(DropRule::conditional(13, 2, "Night")),
            DropRule::fixed(14, 1).stack(1, 3),
        )
        .chain(DropRule::fixed(15, 8));

        assert_eq!(resolve(&rule, &names), resolve(&rule, &names));
    }

    #[test]
    fn test_pre_order_with_chain_append() {
        let names = names();
        let rule = DropRule::one_of(vec![10, 11], 4).chain(DropRule::fixed(12, 1));
        let drops = resolve(&rule, &names);
        assert_eq!(ids(&drops), vec![10, 11, 12]);
        assert!((drops[0].drop_chance - 0.125).abs() < EPSILON);
        assert!((drops[1].drop_chance - 0.125).abs() < EPSILON);
        assert!((drops[2].drop_chance - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_display_helpers() {
        let names = names();
        let drop = &resolve(&DropRule::fixed(1, 8).stack(2, 4), &names)[0];
        assert_eq!(drop.chance_display(), "12.50%");
        assert_eq!(drop.stack_display(), "2-4");
    }
}
