use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use super::super::catalog::{Archetype, ArchetypeCatalog};
use super::super::domain::{Category, CategoryScores, CategorySet, CategoryStanding};
use super::config::ClassificationPolicy;
use crate::config::ConfigError;

/// Score differences smaller than this are treated as equal.
pub(crate) const SCORE_TOLERANCE: f64 = 1e-9;

/// Which rule produced a classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ClassificationBasis {
    Balanced { spread: f64 },
    PrivilegedPair { lead: String, partner: String },
    Pairing { primary: String, secondary: String },
    Primary { primary: String },
}

impl ClassificationBasis {
    pub fn summary(&self) -> String {
        match self {
            ClassificationBasis::Balanced { spread } => {
                format!("balanced profile (spread {:.2})", spread)
            }
            ClassificationBasis::PrivilegedPair { lead, partner } => {
                format!("{lead} and {partner} lead together, clear of the rest")
            }
            ClassificationBasis::Pairing { primary, secondary } => {
                format!("{primary} first, {secondary} second")
            }
            ClassificationBasis::Primary { primary } => format!("{primary} leads"),
        }
    }
}

/// Classification result borrowed from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<'a> {
    pub archetype: &'a Archetype,
    pub basis: ClassificationBasis,
}

struct ResolvedPrivileged {
    lead: Category,
    partner: Category,
    within: f64,
    margin: f64,
    archetype: usize,
}

struct ResolvedPairing {
    primary: Category,
    secondary: Category,
    ordered: bool,
    min_secondary: f64,
    archetype: usize,
}

/// Validated policy bound to a category set and archetype catalog. Total over
/// every score profile: `classify` never fails once construction succeeds.
pub struct Classifier {
    categories: CategorySet,
    catalog: ArchetypeCatalog,
    policy: ClassificationPolicy,
    balanced: usize,
    privileged: Vec<ResolvedPrivileged>,
    pairings: Vec<ResolvedPairing>,
    primary: Vec<usize>,
}

impl Classifier {
    pub fn new(
        categories: CategorySet,
        catalog: ArchetypeCatalog,
        policy: ClassificationPolicy,
    ) -> Result<Self, ConfigError> {
        check_threshold("balance_threshold", policy.balance_threshold)?;
        let balanced = archetype_index(
            &catalog,
            &policy.balanced_archetype,
            "balanced_archetype".to_string(),
        )?;

        let mut privileged = Vec::with_capacity(policy.privileged_pairs.len());
        for rule in &policy.privileged_pairs {
            let referenced_by = format!("privileged pair {}+{}", rule.lead, rule.partner);
            check_threshold("within", rule.within)?;
            check_threshold("margin", rule.margin)?;
            let lead = category(&categories, &rule.lead, &referenced_by)?;
            let partner = category(&categories, &rule.partner, &referenced_by)?;
            if lead == partner {
                return Err(ConfigError::DegeneratePair {
                    category: rule.lead.clone(),
                    referenced_by,
                });
            }
            privileged.push(ResolvedPrivileged {
                lead,
                partner,
                within: rule.within,
                margin: rule.margin,
                archetype: archetype_index(&catalog, &rule.archetype, referenced_by)?,
            });
        }

        let mut pairings = Vec::with_capacity(policy.pairings.len());
        for rule in &policy.pairings {
            let referenced_by = format!("pairing {}+{}", rule.primary, rule.secondary);
            check_threshold("min_secondary", rule.min_secondary)?;
            let primary = category(&categories, &rule.primary, &referenced_by)?;
            let secondary = category(&categories, &rule.secondary, &referenced_by)?;
            if primary == secondary {
                return Err(ConfigError::DegeneratePair {
                    category: rule.primary.clone(),
                    referenced_by,
                });
            }
            pairings.push(ResolvedPairing {
                primary,
                secondary,
                ordered: rule.ordered,
                min_secondary: rule.min_secondary,
                archetype: archetype_index(&catalog, &rule.archetype, referenced_by)?,
            });
        }

        let mut primary: Vec<Option<usize>> = vec![None; categories.len()];
        for (code, archetype) in &policy.primary_archetypes {
            let referenced_by = format!("primary archetype for {code}");
            let category = category(&categories, code, &referenced_by)?;
            primary[category.index()] = Some(archetype_index(&catalog, archetype, referenced_by)?);
        }
        let primary = categories
            .iter()
            .map(|category| {
                primary[category.index()].ok_or_else(|| {
                    ConfigError::MissingPrimaryArchetype(categories.code(category).to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            categories = categories.len(),
            privileged = privileged.len(),
            pairings = pairings.len(),
            balance_threshold = policy.balance_threshold,
            "classification policy resolved"
        );

        Ok(Self {
            categories,
            catalog,
            policy,
            balanced,
            privileged,
            pairings,
            primary,
        })
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn catalog(&self) -> &ArchetypeCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    pub fn classify<S: CategoryScores + ?Sized>(&self, scores: &S) -> &Archetype {
        self.explain(scores).archetype
    }

    /// Classifies and reports the rule that fired.
    pub fn explain<S: CategoryScores + ?Sized>(&self, scores: &S) -> Classification<'_> {
        let (index, basis) = self.decide(scores);
        Classification {
            archetype: self.catalog.at(index),
            basis,
        }
    }

    /// Categories ordered by score descending; equal scores keep declaration order.
    pub fn rank<S: CategoryScores + ?Sized>(&self, scores: &S) -> Vec<Category> {
        let mut ranked: Vec<Category> = self.categories.iter().collect();
        ranked.sort_by(|left, right| compare(scores.value(*right), scores.value(*left)));
        ranked
    }

    /// The `underused_count` lowest categories, ascending; equal scores keep
    /// declaration order.
    pub fn underused<S: CategoryScores + ?Sized>(&self, scores: &S) -> Vec<CategoryStanding> {
        let mut ascending: Vec<Category> = self.categories.iter().collect();
        ascending.sort_by(|left, right| compare(scores.value(*left), scores.value(*right)));
        ascending
            .into_iter()
            .take(self.policy.underused_count)
            .map(|category| self.standing(category, scores))
            .collect()
    }

    pub fn standing<S: CategoryScores + ?Sized>(
        &self,
        category: Category,
        scores: &S,
    ) -> CategoryStanding {
        CategoryStanding {
            category,
            code: self.categories.code(category).to_string(),
            name: self.categories.name(category).to_string(),
            score: scores.value(category),
        }
    }

    fn decide<S: CategoryScores + ?Sized>(&self, scores: &S) -> (usize, ClassificationBasis) {
        let spread = self.spread(scores);
        if spread <= self.policy.balance_threshold + SCORE_TOLERANCE {
            return (self.balanced, ClassificationBasis::Balanced { spread });
        }

        for rule in &self.privileged {
            if self.privileged_applies(rule, scores) {
                return (
                    rule.archetype,
                    ClassificationBasis::PrivilegedPair {
                        lead: self.categories.code(rule.lead).to_string(),
                        partner: self.categories.code(rule.partner).to_string(),
                    },
                );
            }
        }

        let ranked = self.rank(scores);
        let primary = ranked[0];
        let primary_code = self.categories.code(primary).to_string();

        if let Some(&secondary) = ranked.get(1) {
            let secondary_score = scores.value(secondary);
            let pairing = self.pairings.iter().find(|rule| {
                let matches = (rule.primary == primary && rule.secondary == secondary)
                    || (!rule.ordered && rule.primary == secondary && rule.secondary == primary);
                matches && secondary_score + SCORE_TOLERANCE >= rule.min_secondary
            });
            if let Some(rule) = pairing {
                return (
                    rule.archetype,
                    ClassificationBasis::Pairing {
                        primary: primary_code,
                        secondary: self.categories.code(secondary).to_string(),
                    },
                );
            }
        }

        (
            self.primary[primary.index()],
            ClassificationBasis::Primary {
                primary: primary_code,
            },
        )
    }

    fn spread<S: CategoryScores + ?Sized>(&self, scores: &S) -> f64 {
        let mut values = self.categories.iter().map(|category| scores.value(category));
        let first = values.next().unwrap_or_default();
        let (min, max) = values.fold((first, first), |(min, max), value| {
            (min.min(value), max.max(value))
        });
        max - min
    }

    fn privileged_applies<S: CategoryScores + ?Sized>(
        &self,
        rule: &ResolvedPrivileged,
        scores: &S,
    ) -> bool {
        let lead = scores.value(rule.lead);
        let partner = scores.value(rule.partner);
        if (lead - partner).abs() > rule.within + SCORE_TOLERANCE {
            return false;
        }

        self.categories
            .iter()
            .filter(|category| *category != rule.lead && *category != rule.partner)
            .all(|category| lead - scores.value(category) - rule.margin > SCORE_TOLERANCE)
    }
}

fn compare(left: f64, right: f64) -> Ordering {
    left.total_cmp(&right)
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold {
            name,
            value: value.to_string(),
        })
    }
}

fn category(
    categories: &CategorySet,
    code: &str,
    referenced_by: &str,
) -> Result<Category, ConfigError> {
    categories
        .lookup(code)
        .ok_or_else(|| ConfigError::UnknownPolicyCategory {
            code: code.to_string(),
            referenced_by: referenced_by.to_string(),
        })
}

fn archetype_index(
    catalog: &ArchetypeCatalog,
    code: &str,
    referenced_by: String,
) -> Result<usize, ConfigError> {
    catalog
        .position(code)
        .ok_or_else(|| ConfigError::UnknownArchetype {
            code: code.to_string(),
            referenced_by,
        })
}
