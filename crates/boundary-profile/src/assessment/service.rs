use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use super::domain::{AnswerSet, ItemId};
use super::engine::{ProfileEngine, ProfileOutcome};
use super::repository::{
    AssessmentSession, RepositoryError, SessionId, SessionProgress, SessionRepository,
};

/// Service composing the shared engine with per-session answer storage.
pub struct AssessmentService<R> {
    engine: Arc<ProfileEngine>,
    repository: Arc<R>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

impl<R> AssessmentService<R>
where
    R: SessionRepository + 'static,
{
    pub fn new(engine: Arc<ProfileEngine>, repository: Arc<R>) -> Self {
        Self { engine, repository }
    }

    pub fn engine(&self) -> &ProfileEngine {
        &self.engine
    }

    /// Start a session with a freshly shuffled presentation order.
    pub fn start(&self) -> Result<AssessmentSession, AssessmentServiceError> {
        self.start_with_rng(&mut rand::thread_rng())
    }

    pub fn start_with_rng<G: Rng + ?Sized>(
        &self,
        rng: &mut G,
    ) -> Result<AssessmentSession, AssessmentServiceError> {
        let mut order: Vec<ItemId> = self
            .engine
            .bank()
            .items()
            .iter()
            .map(|item| item.id.clone())
            .collect();
        order.shuffle(rng);

        let session = AssessmentSession {
            id: next_session_id(),
            started_at: Utc::now(),
            order,
            answers: AnswerSet::new(),
        };

        let stored = self.repository.insert(session)?;
        info!(session = %stored.id, items = stored.order.len(), "assessment session started");
        Ok(stored)
    }

    /// Record (or clear, with `None`) the answer for one item. Unlike stale
    /// answers at scoring time, unknown items and options are rejected here.
    pub fn answer(
        &self,
        session_id: &SessionId,
        item_id: ItemId,
        label: Option<String>,
    ) -> Result<SessionProgress, AssessmentServiceError> {
        let bank = self.engine.bank();
        let item = bank
            .item(&item_id)
            .ok_or_else(|| AssessmentServiceError::UnknownItem(item_id.clone()))?;

        if let Some(label) = &label {
            if item.option(label).is_none() {
                return Err(AssessmentServiceError::UnknownOption {
                    item: item_id,
                    label: label.clone(),
                });
            }
        }

        let progress = self.repository.modify(session_id, |session| {
            match label {
                Some(label) => {
                    debug!(session = %session_id, item = %item_id, "answer recorded");
                    session.answers.choose(item_id, label);
                }
                None => {
                    debug!(session = %session_id, item = %item_id, "answer cleared");
                    session.answers.clear(&item_id);
                }
            }
            session.progress(bank)
        })?;
        Ok(progress)
    }

    pub fn clear(
        &self,
        session_id: &SessionId,
        item_id: ItemId,
    ) -> Result<SessionProgress, AssessmentServiceError> {
        self.answer(session_id, item_id, None)
    }

    pub fn progress(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionProgress, AssessmentServiceError> {
        let session = self.get(session_id)?;
        Ok(session.progress(self.engine.bank()))
    }

    /// Score and classify the session. Unless `allow_partial` is set, every item
    /// must be answered first.
    pub fn result(
        &self,
        session_id: &SessionId,
        allow_partial: bool,
    ) -> Result<ProfileOutcome, AssessmentServiceError> {
        let session = self.get(session_id)?;
        let progress = session.progress(self.engine.bank());
        if !allow_partial && !progress.complete {
            return Err(AssessmentServiceError::Incomplete {
                answered: progress.answered,
                total: progress.total,
            });
        }

        let outcome = self.engine.evaluate(&session.answers);
        info!(
            session = %session_id,
            archetype = %outcome.archetype.code,
            answered = outcome.answered,
            "assessment classified"
        );
        Ok(outcome)
    }

    pub fn finish(&self, session_id: &SessionId) -> Result<(), AssessmentServiceError> {
        self.repository.remove(session_id)?;
        Ok(())
    }

    pub fn get(&self, session_id: &SessionId) -> Result<AssessmentSession, AssessmentServiceError> {
        let session = self
            .repository
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("item '{0}' is not part of this assessment")]
    UnknownItem(ItemId),
    #[error("item '{item}' has no option labelled '{label}'")]
    UnknownOption { item: ItemId, label: String },
    #[error("{answered} of {total} items answered; finish the assessment or request a partial result")]
    Incomplete { answered: usize, total: usize },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
