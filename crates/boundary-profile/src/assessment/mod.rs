//! Boundary-crossing self-assessment: item bank, archetype catalog, scoring and
//! classification engine, and the session service that feeds it.

pub mod bank;
pub mod catalog;
pub mod domain;
pub mod engine;
pub mod likert;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use bank::{ItemBank, ItemView};
pub use catalog::{Archetype, ArchetypeCatalog};
pub use domain::{
    AnswerSet, Category, CategoryDefinition, CategoryScores, CategorySet, CategoryStanding, Item,
    ItemDefinition, ItemId, ItemOption, MeanScores, OptionDefinition, ScoreVector,
};
pub use engine::{
    ClassificationBasis, ClassificationPolicy, Classifier, PairingRule, PrivilegedPair,
    ProfileEngine, ProfileExport, ProfileOutcome, StaleAnswer, StaleReason, Tally,
};
pub use likert::{LikertAssessment, LikertInstrument, LikertOutcome, LikertResponses};
pub use repository::{
    AssessmentSession, RepositoryError, SessionId, SessionProgress, SessionRepository,
};
pub use router::assessment_router;
pub use service::{AssessmentService, AssessmentServiceError};
