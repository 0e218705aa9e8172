//! Rating-scale variant of the assessment: each statement belongs to one category
//! and is rated 1-5; categories are scored by their mean rating.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::{Archetype, ArchetypeCatalog};
use super::domain::{Category, CategorySet, CategoryStanding, ItemId, MeanScores};
use super::engine::{ClassificationBasis, ClassificationPolicy, Classifier, ProfileExport};
use crate::config::ConfigError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Raw ratings keyed by statement id. Values are kept wide so out-of-scale input
/// reaches validation instead of failing to parse.
pub type LikertResponses = BTreeMap<ItemId, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDefinition {
    pub id: String,
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikertStatement {
    pub id: ItemId,
    pub category: Category,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct LikertInstrument {
    categories: CategorySet,
    statements: Vec<LikertStatement>,
}

impl LikertInstrument {
    pub fn new(
        categories: CategorySet,
        definitions: Vec<StatementDefinition>,
    ) -> Result<Self, ConfigError> {
        if definitions.is_empty() {
            return Err(ConfigError::EmptyBank);
        }

        let mut ids = HashSet::with_capacity(definitions.len());
        let mut statements = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if !ids.insert(definition.id.clone()) {
                return Err(ConfigError::DuplicateItem(definition.id));
            }
            let category = categories.lookup(&definition.category).ok_or_else(|| {
                ConfigError::UnknownCategory {
                    item: definition.id.clone(),
                    label: definition.text.clone(),
                    category: definition.category.clone(),
                }
            })?;
            statements.push(LikertStatement {
                id: ItemId(definition.id),
                category,
                text: definition.text,
            });
        }

        Ok(Self {
            categories,
            statements,
        })
    }

    /// Twenty statements, five per boundary-crossing mechanism.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(CategorySet::boundary_crossing(), standard_statements())
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn statements(&self) -> &[LikertStatement] {
        &self.statements
    }

    /// Per-category mean of the valid ratings, rounded to two decimals. Categories
    /// without a valid rating score zero.
    pub fn mean_scores(&self, responses: &LikertResponses) -> LikertTally {
        let mut sums = vec![0i64; self.categories.len()];
        let mut counts = vec![0u32; self.categories.len()];
        let mut skipped = Vec::new();
        let mut rated = 0;

        for (item_id, rating) in responses {
            let Some(statement) = self.statements.iter().find(|s| &s.id == item_id) else {
                warn!(item = %item_id, rating, "rating references an unknown statement");
                skipped.push(SkippedRating {
                    item_id: item_id.clone(),
                    rating: *rating,
                    reason: SkipReason::UnknownStatement,
                });
                continue;
            };

            if !(MIN_RATING..=MAX_RATING).contains(rating) {
                warn!(item = %item_id, rating, "rating outside the 1-5 scale");
                skipped.push(SkippedRating {
                    item_id: item_id.clone(),
                    rating: *rating,
                    reason: SkipReason::OutOfRange,
                });
                continue;
            }

            let index = statement.category.index();
            sums[index] += *rating;
            counts[index] += 1;
            rated += 1;
        }

        let means = sums
            .iter()
            .zip(&counts)
            .map(|(sum, count)| {
                if *count == 0 {
                    0.0
                } else {
                    round_hundredths(*sum as f64 / f64::from(*count))
                }
            })
            .collect();

        LikertTally {
            scores: MeanScores::new(self.categories.codes(), means),
            rated,
            skipped,
        }
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikertTally {
    pub scores: MeanScores,
    pub rated: usize,
    pub skipped: Vec<SkippedRating>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRating {
    pub item_id: ItemId,
    pub rating: i64,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownStatement,
    OutOfRange,
}

/// Statement instrument bound to its classification policy.
pub struct LikertAssessment {
    instrument: LikertInstrument,
    classifier: Classifier,
}

impl LikertAssessment {
    pub fn new(
        instrument: LikertInstrument,
        catalog: ArchetypeCatalog,
        policy: ClassificationPolicy,
    ) -> Result<Self, ConfigError> {
        let classifier = Classifier::new(instrument.categories().clone(), catalog, policy)?;
        Ok(Self {
            instrument,
            classifier,
        })
    }

    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(
            LikertInstrument::standard()?,
            ArchetypeCatalog::standard(),
            ClassificationPolicy::likert(),
        )
    }

    pub fn instrument(&self) -> &LikertInstrument {
        &self.instrument
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn evaluate(&self, responses: &LikertResponses) -> LikertOutcome {
        let tally = self.instrument.mean_scores(responses);
        let classification = self.classifier.explain(&tally.scores);
        let underused = self.classifier.underused(&tally.scores);

        LikertOutcome {
            archetype: classification.archetype.clone(),
            basis: classification.basis,
            underused,
            rated: tally.rated,
            total_statements: self.instrument.statements().len(),
            skipped: tally.skipped,
            scores: tally.scores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikertOutcome {
    pub scores: MeanScores,
    pub archetype: Archetype,
    pub basis: ClassificationBasis,
    pub underused: Vec<CategoryStanding>,
    pub rated: usize,
    pub total_statements: usize,
    pub skipped: Vec<SkippedRating>,
}

impl LikertOutcome {
    pub fn export(&self) -> ProfileExport<MeanScores> {
        ProfileExport {
            scores: self.scores.clone(),
            archetype: self.archetype.name.clone(),
        }
    }
}

fn statement(id: u8, category: &str, text: &str) -> StatementDefinition {
    StatementDefinition {
        id: id.to_string(),
        category: category.to_string(),
        text: text.to_string(),
    }
}

fn standard_statements() -> Vec<StatementDefinition> {
    vec![
        statement(1, "I", "I can name the key differences in goals and language between my team and a partner team."),
        statement(2, "I", "Before collaborating, I map stakeholders' incentives, constraints, and decision rights."),
        statement(3, "I", "I notice when two groups use different terms for the same idea and call it out to align meaning."),
        statement(4, "I", "I can articulate my team's norms and blind spots without becoming defensive."),
        statement(5, "I", "I deliberately observe how boundaries (departmental, cultural, or professional) shape decision-making in my organisation."),
        statement(6, "C", "I introduce shared artefacts (logic models, dashboards, templates) to coordinate work across groups."),
        statement(7, "C", "I simplify jargon and translate between technical and non-technical colleagues in real time."),
        statement(8, "C", "I design lightweight routines that help information move smoothly between teams."),
        statement(9, "C", "When priorities clash, I negotiate minimal viable agreements so work can continue."),
        statement(10, "C", "I help different groups use a common framework or language to describe their outcomes."),
        statement(11, "R", "Working with people from other disciplines often changes how I think about my own work."),
        statement(12, "R", "I seek feedback from colleagues who see a challenge from a completely different angle."),
        statement(13, "R", "I pause projects occasionally to ask, 'What assumptions are we making here?'"),
        statement(14, "R", "I share stories of what I've learned from mistakes or mismatched expectations."),
        statement(15, "R", "I use reflective spaces (retrospectives, journaling, dialogue) to make learning visible."),
        statement(16, "T", "I co-create new ways of working that combine multiple frameworks or disciplines."),
        statement(17, "T", "I test boundary-spanning solutions with diverse users before scaling."),
        statement(18, "T", "I tell integrative stories that help different stakeholders see a shared vision."),
        statement(19, "T", "I willingly retire legacy practices when a better co-created alternative appears."),
        statement(20, "T", "I mentor others to design across boundaries and sustain collaborative practices."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::domain::CategoryScores;

    fn ratings(per_category: [[i64; 5]; 4]) -> LikertResponses {
        let mut responses = LikertResponses::new();
        for (block, values) in per_category.iter().enumerate() {
            for (offset, rating) in values.iter().enumerate() {
                let id = block * 5 + offset + 1;
                responses.insert(ItemId(id.to_string()), *rating);
            }
        }
        responses
    }

    fn assessment() -> LikertAssessment {
        LikertAssessment::standard().expect("standard likert assessment valid")
    }

    #[test]
    fn means_are_rounded_to_hundredths() {
        let instrument = LikertInstrument::standard().expect("valid");
        let tally = instrument.mean_scores(&ratings([
            [5, 4, 4, 4, 4],
            [3, 3, 3, 3, 4],
            [1, 2, 2, 2, 2],
            [1, 1, 1, 1, 1],
        ]));
        assert_eq!(tally.scores.get_code("I"), Some(4.2));
        assert_eq!(tally.scores.get_code("C"), Some(3.2));
        assert_eq!(tally.scores.get_code("R"), Some(1.8));
        assert_eq!(tally.scores.get_code("T"), Some(1.0));
        assert_eq!(tally.rated, 20);
    }

    #[test]
    fn neutral_ratings_weave_everything_together() {
        let outcome = assessment().evaluate(&ratings([[3; 5]; 4]));
        assert_eq!(outcome.archetype.code, "integrative_weaver");
        assert_eq!(
            serde_json::to_value(outcome.export()).expect("serializes")["archetype"],
            "Integrative Weaver"
        );
    }

    #[test]
    fn close_identification_and_coordination_make_a_navigator() {
        let outcome = assessment().evaluate(&ratings([
            [5, 4, 4, 4, 4],
            [4, 4, 4, 4, 4],
            [3, 3, 3, 3, 3],
            [3, 3, 3, 3, 3],
        ]));
        // Raw subtraction overshoots the 0.2 window.
        assert!(outcome.scores.get_code("I").unwrap_or_default() - 4.0 > 0.2);
        assert_eq!(outcome.archetype.code, "system_navigator");
        assert!(matches!(
            outcome.basis,
            ClassificationBasis::PrivilegedPair { .. }
        ));
    }

    #[test]
    fn navigator_needs_a_margin_over_the_rest() {
        let outcome = assessment().evaluate(&ratings([
            [4, 4, 4, 4, 4],
            [4, 4, 4, 4, 4],
            [4, 4, 4, 4, 3],
            [3, 3, 3, 3, 3],
        ]));
        assert_eq!(outcome.scores.get_code("R"), Some(3.8));
        assert_eq!(outcome.archetype.code, "boundary_mapper");
    }

    #[test]
    fn dominant_transformation_is_a_catalyst() {
        let outcome = assessment().evaluate(&ratings([
            [2, 2, 2, 2, 2],
            [2, 2, 2, 2, 2],
            [3, 3, 3, 3, 3],
            [5, 5, 5, 5, 4],
        ]));
        assert_eq!(outcome.archetype.code, "ecosystem_catalyst");
        let underused: Vec<_> = outcome.underused.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(underused, vec!["I", "C"]);
    }

    #[test]
    fn invalid_ratings_are_skipped_not_fatal() {
        let instrument = LikertInstrument::standard().expect("valid");
        let mut responses = ratings([[4; 5]; 4]);
        responses.insert(ItemId::new("1"), 9);
        responses.insert(ItemId::new("99"), 3);

        let tally = instrument.mean_scores(&responses);

        assert_eq!(tally.rated, 19);
        assert_eq!(tally.skipped.len(), 2);
        assert!(tally
            .skipped
            .iter()
            .any(|skip| skip.reason == SkipReason::OutOfRange && skip.item_id.as_str() == "1"));
        assert_eq!(tally.scores.get_code("I"), Some(4.0));
        assert_eq!(tally.scores.category_count(), 4);
    }

    #[test]
    fn ratings_beyond_a_byte_still_parse_and_are_skipped() {
        let instrument = LikertInstrument::standard().expect("valid");
        let responses: LikertResponses =
            serde_json::from_str(r#"{"1": 4, "2": 300, "3": -1, "6": 5}"#)
                .expect("wide ratings deserialize");

        let tally = instrument.mean_scores(&responses);

        assert_eq!(tally.rated, 2);
        let out_of_range: Vec<_> = tally
            .skipped
            .iter()
            .filter(|skip| skip.reason == SkipReason::OutOfRange)
            .map(|skip| skip.rating)
            .collect();
        assert_eq!(out_of_range, vec![300, -1]);
        assert_eq!(tally.scores.get_code("I"), Some(4.0));
        assert_eq!(tally.scores.get_code("C"), Some(5.0));
    }

    #[test]
    fn unrated_categories_score_zero() {
        let instrument = LikertInstrument::standard().expect("valid");
        let mut responses = LikertResponses::new();
        responses.insert(ItemId::new("6"), 5);
        let tally = instrument.mean_scores(&responses);
        assert_eq!(tally.scores.get_code("C"), Some(5.0));
        assert_eq!(tally.scores.get_code("I"), Some(0.0));
    }
}
