use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Archetype code plus the display metadata a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    pub summary: String,
    pub tip: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Archetype {
    fn new(
        code: &str,
        name: &str,
        emoji: &str,
        summary: &str,
        tip: &str,
        tags: &[&str],
    ) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            summary: summary.to_string(),
            tip: tip.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    pub fn headline(&self) -> String {
        if self.emoji.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.emoji, self.name)
        }
    }
}

/// Fixed catalog of archetypes, unique by code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchetypeCatalog {
    archetypes: Vec<Archetype>,
}

impl ArchetypeCatalog {
    pub fn new(archetypes: Vec<Archetype>) -> Result<Self, ConfigError> {
        let mut codes = HashSet::with_capacity(archetypes.len());
        for archetype in &archetypes {
            if !codes.insert(archetype.code.as_str()) {
                return Err(ConfigError::DuplicateArchetype(archetype.code.clone()));
            }
        }
        Ok(Self { archetypes })
    }

    pub fn standard() -> Self {
        Self {
            archetypes: vec![
                Archetype::new(
                    "boundary_mapper",
                    "Boundary Mapper",
                    "🗺",
                    "Sees and names boundaries clearly; surfaces invisible assumptions.",
                    "Move from describing boundaries to designing crossings.",
                    &["Identification"],
                ),
                Archetype::new(
                    "bridge_architect",
                    "Bridge Architect",
                    "🔗",
                    "Builds routines and artefacts that connect diverse people and systems.",
                    "Balance process with purpose; connect hearts as well as systems.",
                    &["Coordination"],
                ),
                Archetype::new(
                    "reflective_sense_maker",
                    "Reflective Sense-Maker",
                    "🪞",
                    "Turns difference into learning; models curiosity and psychological safety.",
                    "Translate reflection into one visible change.",
                    &["Reflection"],
                ),
                Archetype::new(
                    "ecosystem_catalyst",
                    "Ecosystem Catalyst",
                    "🌾",
                    "Co-creates new practices and stories that unite perspectives.",
                    "Codify innovations so others can adopt them.",
                    &["Transformation"],
                ),
                Archetype::new(
                    "system_navigator",
                    "System Navigator",
                    "🧭",
                    "Connects strategy, people, and data; aligns agendas across levels.",
                    "Slow down for reflection and make learning visible.",
                    &["Identification", "Coordination"],
                ),
                Archetype::new(
                    "learning_broker",
                    "Learning Broker",
                    "🤝",
                    "Builds shared routines and then uses them to surface what each side learns.",
                    "Let one routine lapse on purpose and see what the group invents instead.",
                    &["Coordination", "Reflection"],
                ),
                Archetype::new(
                    "reflective_innovator",
                    "Reflective Innovator",
                    "🌱",
                    "Questions assumptions and turns the answers into new shared practice.",
                    "Map who is affected before the next redesign.",
                    &["Reflection", "Transformation"],
                ),
                Archetype::new(
                    "integrative_weaver",
                    "Integrative Weaver",
                    "🕸",
                    "Balances mapping, bridging, reflecting, and transforming; mentors others to weave.",
                    "Build institutional pathways so weaving continues beyond you.",
                    &["Identification", "Coordination", "Reflection", "Transformation"],
                ),
            ],
        }
    }

    pub fn get(&self, code: &str) -> Option<&Archetype> {
        self.archetypes
            .iter()
            .find(|archetype| archetype.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub(crate) fn position(&self, code: &str) -> Option<usize> {
        self.archetypes
            .iter()
            .position(|archetype| archetype.code == code)
    }

    pub(crate) fn at(&self, index: usize) -> &Archetype {
        &self.archetypes[index]
    }
}
