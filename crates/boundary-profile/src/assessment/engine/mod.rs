mod config;
mod policy;
mod rules;

pub use config::{ClassificationPolicy, PairingRule, PrivilegedPair};
pub use policy::{Classification, ClassificationBasis, Classifier};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::bank::ItemBank;
use super::catalog::{Archetype, ArchetypeCatalog};
use super::domain::{
    AnswerSet, CategoryScores, CategorySet, CategoryStanding, ItemId, ScoreVector,
};
use crate::config::{ConfigError, ProfileSettings};

/// Stateless engine binding the item bank to a validated classification policy.
/// Shared read-only across sessions.
pub struct ProfileEngine {
    bank: ItemBank,
    classifier: Classifier,
}

impl ProfileEngine {
    pub fn new(
        bank: ItemBank,
        catalog: ArchetypeCatalog,
        policy: ClassificationPolicy,
    ) -> Result<Self, ConfigError> {
        let classifier = Classifier::new(bank.categories().clone(), catalog, policy)?;
        Ok(Self { bank, classifier })
    }

    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(
            ItemBank::standard()?,
            ArchetypeCatalog::standard(),
            ClassificationPolicy::standard(),
        )
    }

    /// Standard catalog and policy with the configured overrides applied.
    pub fn from_settings(settings: &ProfileSettings) -> Result<Self, ConfigError> {
        let bank = match &settings.bank_csv {
            Some(path) => {
                let bank = ItemBank::from_csv_path(CategorySet::boundary_crossing(), path)?;
                info!(path = %path.display(), items = bank.len(), "loaded item bank from CSV");
                bank
            }
            None => ItemBank::standard()?,
        };

        let mut policy = ClassificationPolicy::standard();
        if let Some(threshold) = settings.balance_threshold {
            policy = policy.with_balance_threshold(threshold);
        }

        Self::new(bank, ArchetypeCatalog::standard(), policy)
    }

    pub fn bank(&self) -> &ItemBank {
        &self.bank
    }

    pub fn catalog(&self) -> &ArchetypeCatalog {
        self.classifier.catalog()
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        self.classifier.policy()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Tallies answers per category. Partial answer sets are fine; stale answers
    /// are skipped and reported.
    pub fn score(&self, answers: &AnswerSet) -> Tally {
        rules::tally(&self.bank, answers)
    }

    pub fn classify<S: CategoryScores + ?Sized>(&self, scores: &S) -> &Archetype {
        self.classifier.classify(scores)
    }

    pub fn underused<S: CategoryScores + ?Sized>(&self, scores: &S) -> Vec<CategoryStanding> {
        self.classifier.underused(scores)
    }

    pub fn evaluate(&self, answers: &AnswerSet) -> ProfileOutcome {
        let tally = self.score(answers);
        let classification = self.classifier.explain(&tally.scores);
        let underused = self.classifier.underused(&tally.scores);
        let complete = tally.answered == self.bank.len();

        ProfileOutcome {
            archetype: classification.archetype.clone(),
            basis: classification.basis,
            underused,
            answered: tally.answered,
            total_items: self.bank.len(),
            complete,
            stale_answers: tally.stale,
            scores: tally.scores,
        }
    }
}

/// Score vector plus the answers that could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    pub scores: ScoreVector,
    pub answered: usize,
    pub stale: Vec<StaleAnswer>,
}

/// Answer skipped during scoring because the bank no longer matches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleAnswer {
    pub item_id: ItemId,
    pub label: String,
    pub reason: StaleReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    UnknownItem,
    UnknownOption,
}

/// Everything a presentation layer needs to render a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileOutcome {
    pub scores: ScoreVector,
    pub archetype: Archetype,
    pub basis: ClassificationBasis,
    pub underused: Vec<CategoryStanding>,
    pub answered: usize,
    pub total_items: usize,
    pub complete: bool,
    pub stale_answers: Vec<StaleAnswer>,
}

impl ProfileOutcome {
    pub fn export(&self) -> ProfileExport<ScoreVector> {
        ProfileExport {
            scores: self.scores.clone(),
            archetype: self.archetype.name.clone(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({}; {} of {} answered)",
            self.archetype.name,
            self.basis.summary(),
            self.answered,
            self.total_items
        )
    }
}

/// Flat `{scores, archetype}` document for a "download my results" affordance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileExport<S> {
    pub scores: S,
    pub archetype: String,
}
