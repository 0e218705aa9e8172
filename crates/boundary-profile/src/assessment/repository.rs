use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bank::ItemBank;
use super::domain::{AnswerSet, ItemId};

/// Identifier wrapper for assessment sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One respondent's run through the bank. The presentation order is fixed when
/// the session starts; answers are owned by this session alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub order: Vec<ItemId>,
    pub answers: AnswerSet,
}

impl AssessmentSession {
    pub fn progress(&self, bank: &ItemBank) -> SessionProgress {
        let answered = bank
            .items()
            .iter()
            .filter(|item| self.answers.choice(&item.id).is_some())
            .count();
        let next_item = self
            .order
            .iter()
            .find(|item| self.answers.choice(item).is_none())
            .cloned();

        SessionProgress {
            session_id: self.id.clone(),
            started_at: self.started_at,
            answered,
            total: bank.len(),
            complete: answered == bank.len(),
            next_item,
        }
    }
}

/// Public progress view returned after each answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub answered: usize,
    pub total: usize,
    pub complete: bool,
    pub next_item: Option<ItemId>,
}

/// Storage abstraction so the service can be exercised in isolation.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, RepositoryError>;
    /// Applies `change` to the stored session as one atomic step; concurrent
    /// modifications of the same session must not interleave.
    fn modify<F, T>(&self, id: &SessionId, change: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut AssessmentSession) -> T;
    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError>;
    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
