//! Declarative drop rule definitions
//!
//! A drop rule is an immutable tree. Every node has a [`RuleKind`] describing
//! what it drops on its own, plus any number of chained rules that are
//! evaluated alongside it regardless of the node's own chance.

use serde::{Deserialize, Serialize};

/// Host catalog item type id. `0` is the "no item" sentinel.
pub type ItemId = u32;

/// Host catalog entity (NPC) type id.
pub type EntityId = u32;

/// Sentinel item id used by host catalogs for "no item"
pub const NO_ITEM: ItemId = 0;

fn one() -> u32 {
    1
}

/// Difficulty mode a [`RuleKind::ModeBranch`] switches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Expert,
    Master,
}

impl GameMode {
    /// Human-readable label (e.g., "Expert Mode")
    pub fn label(&self) -> &'static str {
        match self {
            GameMode::Expert => "Expert Mode",
            GameMode::Master => "Master Mode",
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a single rule node drops by itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Drops `item_id` with probability 1/`chance_denominator`
    FixedChance {
        item_id: ItemId,
        chance_denominator: i32,
        #[serde(default = "one")]
        min_stack: u32,
        #[serde(default = "one")]
        max_stack: u32,
    },

    /// Same math as `FixedChance`, annotated with a condition label
    ConditionalChance {
        item_id: ItemId,
        chance_denominator: i32,
        #[serde(default = "one")]
        min_stack: u32,
        #[serde(default = "one")]
        max_stack: u32,
        /// Descriptive condition (e.g., "Not in Expert Mode")
        condition: String,
    },

    /// Exactly one of `item_ids` drops, 1/`chance_denominator` of the time
    OneOfMany {
        item_ids: Vec<ItemId>,
        chance_denominator: i32,
        /// Force every option's stack range to [1, 1]
        #[serde(default)]
        stacks_are_unit: bool,
        #[serde(default = "one")]
        min_stack: u32,
        #[serde(default = "one")]
        max_stack: u32,
    },

    /// Two declared subtrees selected by difficulty mode at drop time.
    /// Both are resolved; neither is evaluated.
    ModeBranch {
        mode: GameMode,
        primary: Box<DropRule>,
        alternate: Box<DropRule>,
    },
}

impl RuleKind {
    /// Short variant name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::FixedChance { .. } => "fixed_chance",
            RuleKind::ConditionalChance { .. } => "conditional_chance",
            RuleKind::OneOfMany { .. } => "one_of_many",
            RuleKind::ModeBranch { .. } => "mode_branch",
        }
    }
}

/// A rule node plus the rules chained after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRule {
    #[serde(flatten)]
    pub kind: RuleKind,
    /// Rules evaluated in sequence after this one, independent of its chance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chained: Vec<DropRule>,
}

impl DropRule {
    /// Wrap a kind with no chained rules
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            chained: Vec::new(),
        }
    }

    /// `item_id` drops one at a time with probability 1/`denominator`
    pub fn fixed(item_id: ItemId, denominator: i32) -> Self {
        Self::new(RuleKind::FixedChance {
            item_id,
            chance_denominator: denominator,
            min_stack: 1,
            max_stack: 1,
        })
    }

    /// Conditional drop carrying a descriptive `condition`
    pub fn conditional(item_id: ItemId, denominator: i32, condition: impl Into<String>) -> Self {
        Self::new(RuleKind::ConditionalChance {
            item_id,
            chance_denominator: denominator,
            min_stack: 1,
            max_stack: 1,
            condition: condition.into(),
        })
    }

    /// One of `item_ids`, each as a single item
    pub fn one_of(item_ids: impl Into<Vec<ItemId>>, denominator: i32) -> Self {
        Self::new(RuleKind::OneOfMany {
            item_ids: item_ids.into(),
            chance_denominator: denominator,
            stacks_are_unit: true,
            min_stack: 1,
            max_stack: 1,
        })
    }

    /// Mode-dependent choice between `primary` and `alternate`
    pub fn mode(mode: GameMode, primary: DropRule, alternate: DropRule) -> Self {
        Self::new(RuleKind::ModeBranch {
            mode,
            primary: Box::new(primary),
            alternate: Box::new(alternate),
        })
    }

    /// Set the stack range. Ignored by `OneOfMany` nodes with unit stacks.
    pub fn stack(mut self, min: u32, max: u32) -> Self {
        match &mut self.kind {
            RuleKind::FixedChance {
                min_stack,
                max_stack,
                ..
            }
            | RuleKind::ConditionalChance {
                min_stack,
                max_stack,
                ..
            }
            | RuleKind::OneOfMany {
                min_stack,
                max_stack,
                ..
            } => {
                *min_stack = min;
                *max_stack = max;
            }
            RuleKind::ModeBranch { .. } => {}
        }
        self
    }

    /// Let a `OneOfMany` node use its own stack range instead of [1, 1]
    pub fn variable_stacks(mut self) -> Self {
        if let RuleKind::OneOfMany {
            stacks_are_unit, ..
        } = &mut self.kind
        {
            *stacks_are_unit = false;
        }
        self
    }

    /// Append a chained rule
    pub fn chain(mut self, rule: DropRule) -> Self {
        self.chained.push(rule);
        self
    }

    /// Difficulty modes this tree branches on, in first-seen order
    pub fn modes(&self) -> Vec<GameMode> {
        let mut modes = Vec::new();
        self.collect_modes(&mut modes);
        modes
    }

    fn collect_modes(&self, modes: &mut Vec<GameMode>) {
        if let RuleKind::ModeBranch {
            mode,
            primary,
            alternate,
        } = &self.kind
        {
            if !modes.contains(mode) {
                modes.push(*mode);
            }
            primary.collect_modes(modes);
            alternate.collect_modes(modes);
        }
        for rule in &self.chained {
            rule.collect_modes(modes);
        }
    }
}

impl From<RuleKind> for DropRule {
    fn from(kind: RuleKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_fields() {
        let rule = DropRule::fixed(12, 3).stack(2, 5).chain(DropRule::fixed(13, 1));
        match &rule.kind {
            RuleKind::FixedChance {
                item_id,
                chance_denominator,
                min_stack,
                max_stack,
            } => {
                assert_eq!(*item_id, 12);
                assert_eq!(*chance_denominator, 3);
                assert_eq!((*min_stack, *max_stack), (2, 5));
            }
            other => panic!("unexpected kind: {}", other.name()),
        }
        assert_eq!(rule.chained.len(), 1);
    }

    #[test]
    fn test_variable_stacks_only_affects_one_of_many() {
        let rule = DropRule::one_of(vec![1, 2], 2).variable_stacks();
        assert!(matches!(
            rule.kind,
            RuleKind::OneOfMany {
                stacks_are_unit: false,
                ..
            }
        ));

        let fixed = DropRule::fixed(1, 1).variable_stacks();
        assert_eq!(fixed, DropRule::fixed(1, 1));
    }

    #[test]
    fn test_deserialize_tagged_json() {
        let json = r#"{
            "type": "one_of_many",
            "item_ids": [10, 11],
            "chance_denominator": 4,
            "stacks_are_unit": true,
            "chained": [
                { "type": "fixed_chance", "item_id": 12, "chance_denominator": 1 }
            ]
        }"#;
        let rule: DropRule = serde_json::from_str(json).unwrap();
        assert_eq!(
            rule,
            DropRule::one_of(vec![10, 11], 4).chain(DropRule::fixed(12, 1))
        );
    }

    #[test]
    fn test_deserialize_mode_branch_yaml() {
        let yaml = r#"
type: mode_branch
mode: expert
primary:
  type: fixed_chance
  item_id: 5
  chance_denominator: 2
alternate:
  type: conditional_chance
  item_id: 6
  chance_denominator: 1
  condition: Expert Mode
"#;
        let rule: DropRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rule,
            DropRule::mode(
                GameMode::Expert,
                DropRule::fixed(5, 2),
                DropRule::conditional(6, 1, "Expert Mode"),
            )
        );
    }

    #[test]
    fn test_modes_walks_branches_and_chains() {
        let rule = DropRule::fixed(1, 1)
            .chain(DropRule::mode(
                GameMode::Expert,
                DropRule::mode(GameMode::Master, DropRule::fixed(2, 1), DropRule::fixed(3, 1)),
                DropRule::fixed(4, 1),
            ))
            .chain(DropRule::mode(
                GameMode::Expert,
                DropRule::fixed(5, 1),
                DropRule::fixed(6, 1),
            ));
        assert_eq!(rule.modes(), vec![GameMode::Expert, GameMode::Master]);
        assert!(DropRule::fixed(1, 1).modes().is_empty());
    }

    #[test]
    fn test_game_mode_label() {
        assert_eq!(GameMode::Expert.to_string(), "Expert Mode");
        assert_eq!(GameMode::Master.label(), "Master Mode");
    }
}
