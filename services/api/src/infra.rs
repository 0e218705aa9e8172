use crate::cli::ProfileArgs;
use boundary_profile::assessment::{
    AssessmentSession, LikertAssessment, ProfileEngine, RepositoryError, SessionId,
    SessionRepository,
};
use boundary_profile::config::ProfileSettings;
use boundary_profile::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<ProfileEngine>,
    pub(crate) likert: Arc<LikertAssessment>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, AssessmentSession>>>,
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, RepositoryError> {
        let mut guard = self.sessions.lock().map_err(poisoned)?;
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
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        let session = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        Ok(change(session))
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError> {
        let guard = self.sessions.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().map_err(poisoned)?;
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("session store lock poisoned".to_string())
}

/// Command-line flags win over the environment.
pub(crate) fn merge_profile_settings(mut settings: ProfileSettings, args: ProfileArgs) -> ProfileSettings {
    if let Some(path) = args.bank_csv {
        settings.bank_csv = Some(path);
    }
    if let Some(threshold) = args.balance_threshold {
        settings.balance_threshold = Some(threshold);
    }
    settings
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)?;
    std::fs::write(path, rendered)?;
    Ok(())
}
