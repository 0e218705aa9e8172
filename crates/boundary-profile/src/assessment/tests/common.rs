use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::assessment::domain::{AnswerSet, CategorySet, ItemDefinition, ScoreVector};
use crate::assessment::repository::{
    AssessmentSession, RepositoryError, SessionId, SessionRepository,
};
use crate::assessment::{
    assessment_router, ArchetypeCatalog, AssessmentService, ClassificationPolicy, ItemBank,
    ProfileEngine,
};

pub(super) const OPTION_LABELS: [(&str, &str); 4] = [
    ("Map the groups involved", "I"),
    ("Set up a shared routine", "C"),
    ("Ask what each side assumes", "R"),
    ("Co-create a new practice", "T"),
];

/// Bank of `count` identical scenario items named `q1..qN`.
pub(super) fn scenario_bank(count: usize) -> ItemBank {
    let definitions = (1..=count)
        .map(|index| {
            OPTION_LABELS.iter().fold(
                ItemDefinition::new(format!("q{index}"), format!("Scenario {index}")),
                |item, (label, category)| item.option(*label, *category),
            )
        })
        .collect();
    ItemBank::new(CategorySet::boundary_crossing(), definitions).expect("scenario bank valid")
}

pub(super) fn scenario_engine(count: usize) -> ProfileEngine {
    engine_with_policy(count, ClassificationPolicy::standard())
}

pub(super) fn engine_with_policy(count: usize, policy: ClassificationPolicy) -> ProfileEngine {
    ProfileEngine::new(scenario_bank(count), ArchetypeCatalog::standard(), policy)
        .expect("engine builds")
}

pub(super) fn label_for(category: &str) -> &'static str {
    OPTION_LABELS
        .iter()
        .find(|(_, code)| *code == category)
        .map(|(label, _)| *label)
        .expect("known category code")
}

/// Answers item `q{n}` with the option tagged `picks[n - 1]`.
pub(super) fn answers_for(picks: &[&str]) -> AnswerSet {
    picks
        .iter()
        .enumerate()
        .map(|(index, category)| (format!("q{}", index + 1), label_for(category)))
        .collect()
}

/// Score vector over the standard categories with the given counts.
pub(super) fn vector(counts: [u32; 4]) -> ScoreVector {
    let categories = CategorySet::boundary_crossing();
    let mut scores = categories.zeroed();
    for (category, count) in categories.iter().zip(counts) {
        for _ in 0..count {
            scores.increment(category);
        }
    }
    scores
}

pub(super) fn build_service() -> (AssessmentService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = AssessmentService::new(Arc::new(scenario_engine(4)), repository.clone());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, AssessmentSession>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.sessions.lock().expect("repository mutex poisoned").len()
    }
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn modify<F, T>(&self, id: &SessionId, change: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut AssessmentSession) -> T,
    {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        let session = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        Ok(change(session))
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

/// Memory store whose writes take a while, widening any window between
/// reading a session and storing it back.
#[derive(Default, Clone)]
pub(super) struct SlowRepository {
    inner: MemoryRepository,
}

impl SlowRepository {
    pub(super) const DELAY: Duration = Duration::from_millis(20);
}

impl SessionRepository for SlowRepository {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, RepositoryError> {
        self.inner.insert(session)
    }

    fn modify<F, T>(&self, id: &SessionId, change: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut AssessmentSession) -> T,
    {
        self.inner.modify(id, |session| {
            std::thread::sleep(Self::DELAY);
            change(session)
        })
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        self.inner.remove(id)
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: AssessmentSession) -> Result<AssessmentSession, RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }

    fn modify<F, T>(&self, _id: &SessionId, _change: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut AssessmentSession) -> T,
    {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }

    fn remove(&self, _id: &SessionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: AssessmentService<MemoryRepository>) -> axum::Router {
    assessment_router(Arc::new(service))
}
