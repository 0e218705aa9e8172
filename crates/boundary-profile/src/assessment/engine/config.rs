use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declarative classification policy. Categories and archetypes are referenced by
/// code and resolved against the category set and catalog when an engine is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    /// Profiles whose max-minus-min spread is at or below this are balanced.
    pub balance_threshold: f64,
    pub balanced_archetype: String,
    /// Checked in order ahead of the pairing table.
    #[serde(default)]
    pub privileged_pairs: Vec<PrivilegedPair>,
    #[serde(default)]
    pub pairings: Vec<PairingRule>,
    /// Category code -> archetype used when no pairing applies.
    pub primary_archetypes: BTreeMap<String, String>,
    #[serde(default = "default_underused_count")]
    pub underused_count: usize,
}

/// Named two-category combination: fires when `lead` and `partner` are within
/// `within` of each other and `lead` beats every other category by more than `margin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivilegedPair {
    pub lead: String,
    pub partner: String,
    pub within: f64,
    pub margin: f64,
    pub archetype: String,
}

/// Pairing table entry keyed by the top two ranked categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingRule {
    pub primary: String,
    pub secondary: String,
    /// When false the entry also matches with primary and secondary swapped.
    #[serde(default)]
    pub ordered: bool,
    /// Secondary score must reach this for the entry to apply.
    #[serde(default)]
    pub min_secondary: f64,
    pub archetype: String,
}

fn default_underused_count() -> usize {
    2
}

impl ClassificationPolicy {
    /// Count-based policy for the scenario bank.
    pub fn standard() -> Self {
        Self {
            balance_threshold: 1.0,
            balanced_archetype: "integrative_weaver".to_string(),
            privileged_pairs: Vec::new(),
            pairings: vec![
                PairingRule::unordered("I", "C", 1.0, "system_navigator"),
                PairingRule::unordered("C", "R", 1.0, "learning_broker"),
                PairingRule::unordered("R", "T", 1.0, "reflective_innovator"),
            ],
            primary_archetypes: primary_archetypes(),
            underused_count: default_underused_count(),
        }
    }

    /// Average-based policy for the 1-5 statement instrument.
    ///
    /// Threshold comparisons allow a small tolerance, so a gap that is exactly
    /// the threshold on paper (I = 4.2 against C = 4.0) counts as within it,
    /// even where raw float subtraction lands just above.
    pub fn likert() -> Self {
        Self {
            balance_threshold: 0.4,
            balanced_archetype: "integrative_weaver".to_string(),
            privileged_pairs: vec![PrivilegedPair {
                lead: "I".to_string(),
                partner: "C".to_string(),
                within: 0.2,
                margin: 0.3,
                archetype: "system_navigator".to_string(),
            }],
            pairings: Vec::new(),
            primary_archetypes: primary_archetypes(),
            underused_count: default_underused_count(),
        }
    }

    pub fn with_balance_threshold(mut self, threshold: f64) -> Self {
        self.balance_threshold = threshold;
        self
    }

    pub fn with_underused_count(mut self, count: usize) -> Self {
        self.underused_count = count;
        self
    }
}

impl PairingRule {
    pub fn unordered(
        primary: &str,
        secondary: &str,
        min_secondary: f64,
        archetype: &str,
    ) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            ordered: false,
            min_secondary,
            archetype: archetype.to_string(),
        }
    }
}

fn primary_archetypes() -> BTreeMap<String, String> {
    [
        ("I", "boundary_mapper"),
        ("C", "bridge_architect"),
        ("R", "reflective_sense_maker"),
        ("T", "ecosystem_catalyst"),
    ]
    .into_iter()
    .map(|(category, archetype)| (category.to_string(), archetype.to_string()))
    .collect()
}
