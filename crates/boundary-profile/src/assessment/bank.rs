use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{
    AnswerSet, CategorySet, Item, ItemDefinition, ItemId, ItemOption, OptionDefinition,
};
use crate::config::ConfigError;

/// Immutable, validated list of items and their category-tagged options.
#[derive(Debug, Clone)]
pub struct ItemBank {
    categories: CategorySet,
    items: Vec<Item>,
    positions: HashMap<ItemId, usize>,
}

impl ItemBank {
    pub fn new(
        categories: CategorySet,
        definitions: Vec<ItemDefinition>,
    ) -> Result<Self, ConfigError> {
        if definitions.is_empty() {
            return Err(ConfigError::EmptyBank);
        }

        let mut items = Vec::with_capacity(definitions.len());
        let mut positions = HashMap::with_capacity(definitions.len());

        for definition in definitions {
            let id = ItemId(definition.id.trim().to_string());
            if positions.contains_key(&id) {
                return Err(ConfigError::DuplicateItem(id.0));
            }

            let options = resolve_options(&categories, &id, definition.options)?;
            positions.insert(id.clone(), items.len());
            items.push(Item {
                id,
                prompt: definition.prompt,
                options,
            });
        }

        Ok(Self {
            categories,
            items,
            positions,
        })
    }

    /// Built-in workplace scenarios tagged against the boundary-crossing mechanisms.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(CategorySet::boundary_crossing(), standard_items())
    }

    /// Loads `item_id,prompt,option_label,category` rows. Rows sharing an item id
    /// are grouped in first-appearance order.
    pub fn from_csv_reader<R: Read>(
        categories: CategorySet,
        reader: R,
    ) -> Result<Self, ConfigError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut definitions: Vec<ItemDefinition> = Vec::new();
        let mut grouped: HashMap<String, usize> = HashMap::new();

        for row in csv_reader.deserialize::<BankRow>() {
            let row = row?;
            let index = match grouped.get(&row.item_id) {
                Some(index) => *index,
                None => {
                    grouped.insert(row.item_id.clone(), definitions.len());
                    definitions.push(ItemDefinition::new(row.item_id.clone(), String::new()));
                    definitions.len() - 1
                }
            };

            let definition = &mut definitions[index];
            if definition.prompt.is_empty() {
                if let Some(prompt) = row.prompt {
                    definition.prompt = prompt;
                }
            }
            definition.options.push(OptionDefinition {
                label: row.option_label,
                category: row.category,
            });
        }

        Self::new(categories, definitions)
    }

    pub fn from_csv_path<P: AsRef<Path>>(
        categories: CategorySet,
        path: P,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::BankRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(categories, file)
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.positions.get(id).map(|index| &self.items[*index])
    }

    pub fn is_complete(&self, answers: &AnswerSet) -> bool {
        self.items
            .iter()
            .all(|item| answers.choice(&item.id).is_some())
    }

    pub fn unanswered<'a>(&'a self, answers: &AnswerSet) -> Vec<&'a ItemId> {
        self.items
            .iter()
            .filter(|item| answers.choice(&item.id).is_none())
            .map(|item| &item.id)
            .collect()
    }

    /// Presentation view that omits the category tags.
    pub fn views(&self) -> Vec<ItemView> {
        self.items
            .iter()
            .map(|item| ItemView {
                id: item.id.clone(),
                prompt: item.prompt.clone(),
                options: item
                    .options
                    .iter()
                    .map(|option| option.label.clone())
                    .collect(),
            })
            .collect()
    }
}

/// Item as shown to a respondent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BankRow {
    item_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    prompt: Option<String>,
    option_label: String,
    category: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn resolve_options(
    categories: &CategorySet,
    item: &ItemId,
    definitions: Vec<OptionDefinition>,
) -> Result<Vec<ItemOption>, ConfigError> {
    if definitions.len() < 2 {
        return Err(ConfigError::TooFewOptions {
            item: item.0.clone(),
            count: definitions.len(),
        });
    }

    let mut labels = HashSet::with_capacity(definitions.len());
    let mut options = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if !labels.insert(definition.label.clone()) {
            return Err(ConfigError::DuplicateOption {
                item: item.0.clone(),
                label: definition.label,
            });
        }

        let category = categories.lookup(&definition.category).ok_or_else(|| {
            ConfigError::UnknownCategory {
                item: item.0.clone(),
                label: definition.label.clone(),
                category: definition.category.clone(),
            }
        })?;

        options.push(ItemOption {
            label: definition.label,
            category,
        });
    }

    Ok(options)
}

fn standard_items() -> Vec<ItemDefinition> {
    vec![
        ItemDefinition::new("kickoff", "A new cross-team project kicks off. What do you do first?")
            .option("Map who is involved and what each group cares about", "I")
            .option("Set up a shared tracker everyone can update", "C")
            .option("Ask each group how they see the problem", "R")
            .option("Sketch a joint way of working that blends both teams' methods", "T"),
        ItemDefinition::new("jargon", "Two colleagues keep talking past each other in a meeting.")
            .option("Point out that they use the same word differently", "I")
            .option("Translate each point into terms the other side uses", "C")
            .option("Pause and ask what each of them assumes the goal is", "R")
            .option("Propose a shared vocabulary the group builds together", "T"),
        ItemDefinition::new("clash", "Two departments' priorities clash on a deadline.")
            .option("Lay out each department's constraints and decision rights", "I")
            .option("Negotiate a minimal agreement so work keeps moving", "C")
            .option("Explore with both sides why the clash keeps recurring", "R")
            .option("Redesign planning so both priorities are built in", "T"),
        ItemDefinition::new("critique", "A partner team criticises your team's approach.")
            .option("Identify which of our norms they are reacting to", "I")
            .option("Agree on a checkpoint where both teams review the work", "C")
            .option("Use the criticism to rethink our own practice", "R")
            .option("Invite them to co-design the next iteration", "T"),
        ItemDefinition::new("wrap_up", "A project spanning three units has just finished.")
            .option("Document where unit boundaries slowed things down", "I")
            .option("Turn what worked into a reusable template", "C")
            .option("Run a retrospective on what everyone learned", "R")
            .option("Pilot a permanent cross-unit practice from the experience", "T"),
        ItemDefinition::new("newcomer", "A newcomer from another discipline joins your team.")
            .option("Explain how our team's world differs from theirs", "I")
            .option("Pair them with someone fluent in both vocabularies", "C")
            .option("Ask what looks strange to them about how we work", "R")
            .option("Blend their methods into how the team works", "T"),
        ItemDefinition::new("buy_in", "You need buy-in from stakeholders with competing incentives.")
            .option("Map each stakeholder's incentives and constraints", "I")
            .option("Build a dashboard everyone reads the same way", "C")
            .option("Host a dialogue where each group hears the others' concerns", "R")
            .option("Tell a story of a shared future that unites their goals", "T"),
        ItemDefinition::new("legacy", "A long-standing practice no longer serves the teams relying on it.")
            .option("Name whose interests the practice still protects", "I")
            .option("Agree a transition plan and hand-off routine", "C")
            .option("Examine which assumptions kept the practice alive", "R")
            .option("Retire it and co-create a better alternative", "T"),
    ]
}
