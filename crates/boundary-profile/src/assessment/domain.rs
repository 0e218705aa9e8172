use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::ConfigError;

/// Handle to a declared category. Ordering follows declaration order, which is
/// also the tie-break order used by ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(usize);

impl Category {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Declared category as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub code: String,
    pub name: String,
}

impl CategoryDefinition {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Closed, ordered set of categories known at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    definitions: Vec<CategoryDefinition>,
}

impl CategorySet {
    pub fn new(definitions: Vec<CategoryDefinition>) -> Result<Self, ConfigError> {
        if definitions.is_empty() {
            return Err(ConfigError::EmptyCategorySet);
        }

        let mut seen = HashSet::new();
        for definition in &definitions {
            if definition.code.trim().is_empty() {
                return Err(ConfigError::InvalidCategoryCode);
            }
            if !seen.insert(definition.code.as_str()) {
                return Err(ConfigError::DuplicateCategory(definition.code.clone()));
            }
        }

        Ok(Self { definitions })
    }

    /// Identification, Coordination, Reflection, Transformation.
    pub fn boundary_crossing() -> Self {
        Self {
            definitions: vec![
                CategoryDefinition::new("I", "Identification"),
                CategoryDefinition::new("C", "Coordination"),
                CategoryDefinition::new("R", "Reflection"),
                CategoryDefinition::new("T", "Transformation"),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        (0..self.definitions.len()).map(Category)
    }

    /// Resolves either a code (`"I"`) or a full name (`"Identification"`).
    pub fn lookup(&self, code: &str) -> Option<Category> {
        let code = code.trim();
        self.definitions
            .iter()
            .position(|definition| definition.code == code)
            .or_else(|| {
                self.definitions
                    .iter()
                    .position(|definition| definition.name.eq_ignore_ascii_case(code))
            })
            .map(Category)
    }

    pub fn code(&self, category: Category) -> &str {
        &self.definitions[category.0].code
    }

    pub fn name(&self, category: Category) -> &str {
        &self.definitions[category.0].name
    }

    pub fn definitions(&self) -> &[CategoryDefinition] {
        &self.definitions
    }

    /// Score vector with every category present at zero.
    pub fn zeroed(&self) -> ScoreVector {
        ScoreVector {
            codes: self.codes(),
            counts: vec![0; self.definitions.len()],
        }
    }

    pub(crate) fn codes(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|definition| definition.code.clone())
            .collect()
    }
}

/// Identifier wrapper for bank items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw option definition; the category is still a code at this stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub label: String,
    pub category: String,
}

/// Raw item definition prior to bank validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub prompt: String,
    pub options: Vec<OptionDefinition>,
}

impl ItemDefinition {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, label: impl Into<String>, category: impl Into<String>) -> Self {
        self.options.push(OptionDefinition {
            label: label.into(),
            category: category.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOption {
    pub label: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub prompt: String,
    pub options: Vec<ItemOption>,
}

impl Item {
    pub fn option(&self, label: &str) -> Option<&ItemOption> {
        self.options.iter().find(|option| option.label == label)
    }
}

/// Per-session answers. Absent entries are unanswered; `null` in JSON clears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ItemId, Option<String>>",
    into = "BTreeMap<ItemId, Option<String>>"
)]
pub struct AnswerSet {
    choices: BTreeMap<ItemId, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a choice, returning the previously chosen label if any.
    pub fn choose(&mut self, item: ItemId, label: impl Into<String>) -> Option<String> {
        self.choices.insert(item, label.into())
    }

    pub fn clear(&mut self, item: &ItemId) -> Option<String> {
        self.choices.remove(item)
    }

    pub fn choice(&self, item: &ItemId) -> Option<&str> {
        self.choices.get(item).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &str)> {
        self.choices
            .iter()
            .map(|(item, label)| (item, label.as_str()))
    }
}

impl From<BTreeMap<ItemId, Option<String>>> for AnswerSet {
    fn from(value: BTreeMap<ItemId, Option<String>>) -> Self {
        let choices = value
            .into_iter()
            .filter_map(|(item, label)| label.map(|label| (item, label)))
            .collect();
        Self { choices }
    }
}

impl From<AnswerSet> for BTreeMap<ItemId, Option<String>> {
    fn from(value: AnswerSet) -> Self {
        value
            .choices
            .into_iter()
            .map(|(item, label)| (item, Some(label)))
            .collect()
    }
}

impl<I, L> FromIterator<(I, L)> for AnswerSet
where
    I: Into<String>,
    L: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (I, L)>>(iter: T) -> Self {
        let choices = iter
            .into_iter()
            .map(|(item, label)| (ItemId(item.into()), label.into()))
            .collect();
        Self { choices }
    }
}

/// Read-only view over per-category values, shared by count and mean scoring.
pub trait CategoryScores {
    fn category_count(&self) -> usize;

    /// Value for a category; categories outside the vector read as zero.
    fn value(&self, category: Category) -> f64;
}

/// Per-category answer counts, one entry per declared category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreVector {
    codes: Vec<String>,
    counts: Vec<u32>,
}

impl ScoreVector {
    pub fn get(&self, category: Category) -> u32 {
        self.counts.get(category.0).copied().unwrap_or_default()
    }

    /// Count for a category code; unknown codes read as `None`.
    pub fn get_code(&self, code: &str) -> Option<u32> {
        self.codes
            .iter()
            .position(|candidate| candidate == code)
            .map(|index| self.counts[index])
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &str, u32)> {
        self.codes
            .iter()
            .zip(&self.counts)
            .enumerate()
            .map(|(index, (code, count))| (Category(index), code.as_str(), *count))
    }

    pub(crate) fn increment(&mut self, category: Category) {
        if let Some(count) = self.counts.get_mut(category.0) {
            *count += 1;
        }
    }
}

impl CategoryScores for ScoreVector {
    fn category_count(&self) -> usize {
        self.counts.len()
    }

    fn value(&self, category: Category) -> f64 {
        f64::from(self.get(category))
    }
}

impl Serialize for ScoreVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.codes.len()))?;
        for (code, count) in self.codes.iter().zip(&self.counts) {
            map.serialize_entry(code, count)?;
        }
        map.end()
    }
}

/// Per-category averages produced by rating-scale instruments.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanScores {
    codes: Vec<String>,
    means: Vec<f64>,
}

impl MeanScores {
    pub(crate) fn new(codes: Vec<String>, means: Vec<f64>) -> Self {
        Self { codes, means }
    }

    pub fn get(&self, category: Category) -> f64 {
        self.means.get(category.0).copied().unwrap_or_default()
    }

    pub fn get_code(&self, code: &str) -> Option<f64> {
        self.codes
            .iter()
            .position(|candidate| candidate == code)
            .map(|index| self.means[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &str, f64)> {
        self.codes
            .iter()
            .zip(&self.means)
            .enumerate()
            .map(|(index, (code, mean))| (Category(index), code.as_str(), *mean))
    }
}

impl CategoryScores for MeanScores {
    fn category_count(&self) -> usize {
        self.means.len()
    }

    fn value(&self, category: Category) -> f64 {
        self.get(category)
    }
}

impl Serialize for MeanScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.codes.len()))?;
        for (code, mean) in self.codes.iter().zip(&self.means) {
            map.serialize_entry(code, mean)?;
        }
        map.end()
    }
}

/// A category with its score, as reported by ranking helpers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStanding {
    #[serde(skip)]
    pub category: Category,
    pub code: String,
    pub name: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_set_rejects_duplicates_and_blanks() {
        let err = CategorySet::new(vec![
            CategoryDefinition::new("I", "Identification"),
            CategoryDefinition::new("I", "Integration"),
        ])
        .expect_err("duplicate rejected");
        assert!(matches!(err, ConfigError::DuplicateCategory(code) if code == "I"));

        let err = CategorySet::new(vec![CategoryDefinition::new("  ", "Blank")])
            .expect_err("blank rejected");
        assert!(matches!(err, ConfigError::InvalidCategoryCode));

        assert!(matches!(
            CategorySet::new(Vec::new()),
            Err(ConfigError::EmptyCategorySet)
        ));
    }

    #[test]
    fn lookup_accepts_codes_and_names() {
        let set = CategorySet::boundary_crossing();
        let reflection = set.lookup("R").expect("code resolves");
        assert_eq!(set.lookup("reflection"), Some(reflection));
        assert_eq!(set.name(reflection), "Reflection");
        assert!(set.lookup("X").is_none());
    }

    #[test]
    fn zeroed_vector_serializes_every_category_in_order() {
        let set = CategorySet::boundary_crossing();
        let scores = set.zeroed();
        let json = serde_json::to_string(&scores).expect("serializes");
        assert_eq!(json, r#"{"I":0,"C":0,"R":0,"T":0}"#);
    }

    #[test]
    fn answer_set_treats_null_as_unanswered() {
        let answers: AnswerSet =
            serde_json::from_str(r#"{"kickoff":"Set up a shared tracker","jargon":null}"#)
                .expect("deserializes");
        assert_eq!(answers.len(), 1);
        assert_eq!(
            answers.choice(&ItemId::new("kickoff")),
            Some("Set up a shared tracker")
        );
        assert!(answers.choice(&ItemId::new("jargon")).is_none());
    }
}
