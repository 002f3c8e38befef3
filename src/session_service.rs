use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::DEFAULT_SESSION_IDLE_TTL_SECS;
use crate::errors::GenerationFailure;
use crate::generation_state::GenerationState;
use crate::models::{SessionSnapshot, StudyPlanResponse};
use crate::plan_client::{PlanRequestClient, SUPPORTED_DAYS};

// Import logging macros
use crate::log_state_transition;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Session '{0}' not found")]
    NotFound(Uuid),

    #[error("A plan is already being generated for session '{0}'")]
    InProgress(Uuid),

    #[error("Study material is empty")]
    EmptyInput,

    #[error("Day count {0} is outside the supported range 1-14")]
    InvalidDayCount(u32),
}

#[derive(Debug, Clone)]
struct GenerationSession {
    state: GenerationState,
    attempts: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GenerationSession {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            state: GenerationState::new(),
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, idle_ttl: Duration) -> bool {
        if self.state.is_generating() {
            return false;
        }
        // A clock step backwards yields an error here and keeps the session
        (now - self.updated_at)
            .to_std()
            .is_ok_and(|idle| idle > idle_ttl)
    }

    fn snapshot(&self, session_id: Uuid) -> SessionSnapshot {
        SessionSnapshot {
            session_id,
            state: self.state.clone(),
            input_enabled: self.state.is_input_enabled(),
            attempts: self.attempts,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// In-memory owner of every session's generation state.
///
/// Each session holds exactly one [`GenerationState`]. The service keeps at
/// most one attempt in flight per session by refusing submissions while the
/// state is `Generating`. Late outcomes for removed or superseded attempts are
/// dropped. Sessions left untouched longer than the idle TTL are evicted
/// when new sessions are created.
#[derive(Clone)]
pub struct SessionService {
    plan_client: PlanRequestClient,
    sessions: Arc<Mutex<HashMap<Uuid, GenerationSession>>>,
    idle_ttl: Duration,
}

impl SessionService {
    pub fn new(plan_client: PlanRequestClient) -> Self {
        Self::with_idle_ttl(plan_client, Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS))
    }

    pub fn with_idle_ttl(plan_client: PlanRequestClient, idle_ttl: Duration) -> Self {
        Self {
            plan_client,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn plan_client(&self) -> &PlanRequestClient {
        &self.plan_client
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<Uuid, GenerationSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_session(&self) -> SessionSnapshot {
        self.prune_idle_sessions();

        let session_id = Uuid::new_v4();
        let session = GenerationSession::new();
        let snapshot = session.snapshot(session_id);
        self.lock_sessions().insert(session_id, session);
        tracing::debug!(session_id = %session_id, "Created generation session");
        snapshot
    }

    pub fn get_session(&self, session_id: Uuid) -> Option<SessionSnapshot> {
        self.lock_sessions()
            .get(&session_id)
            .map(|session| session.snapshot(session_id))
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    /// Evict sessions idle for longer than the TTL. Generating sessions are kept.
    pub fn prune_idle_sessions(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.lock_sessions();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.idle_ttl));

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(
                evicted = evicted,
                remaining = sessions.len(),
                "Evicted idle generation sessions"
            );
        }
        evicted
    }

    /// Tear a session down. An attempt still in flight runs to completion and
    /// its outcome is discarded.
    pub fn remove_session(&self, session_id: Uuid) -> bool {
        self.lock_sessions().remove(&session_id).is_some()
    }

    /// Move the session to `Generating` and start a generation attempt.
    ///
    /// The returned snapshot already shows `Generating`; the outcome lands
    /// later through [`resolve`](Self::resolve). The handle can be awaited to
    /// observe completion.
    pub fn submit(
        &self,
        session_id: Uuid,
        content: String,
        days: u32,
    ) -> Result<(SessionSnapshot, JoinHandle<()>), SubmitError> {
        let (snapshot, attempt) = {
            let mut sessions = self.lock_sessions();
            let session = sessions
                .get_mut(&session_id)
                .ok_or(SubmitError::NotFound(session_id))?;

            if session.state.is_generating() {
                return Err(SubmitError::InProgress(session_id));
            }

            if !SUPPORTED_DAYS.contains(&days) {
                return Err(SubmitError::InvalidDayCount(days));
            }

            let from = session.state.status();
            if !session.state.submit(&content) {
                return Err(SubmitError::EmptyInput);
            }

            session.attempts += 1;
            session.updated_at = Utc::now();
            log_state_transition!(session_id, from = from, to = "generating", attempt = session.attempts);
            (session.snapshot(session_id), session.attempts)
        };

        let service = self.clone();
        let handle = tokio::spawn(async move {
            let result = service.plan_client.generate(&content, days).await;
            service.resolve(session_id, attempt, result);
        });

        Ok((snapshot, handle))
    }

    /// Apply the outcome of `attempt` to the session, if it is still waiting for it
    pub fn resolve(
        &self,
        session_id: Uuid,
        attempt: u64,
        result: Result<StudyPlanResponse, GenerationFailure>,
    ) -> bool {
        let mut sessions = self.lock_sessions();
        let Some(session) = sessions.get_mut(&session_id) else {
            log_state_transition!(discarded, session_id, attempt = attempt, "session no longer exists");
            return false;
        };

        if session.attempts != attempt {
            log_state_transition!(discarded, session_id, attempt = attempt, "superseded by a newer attempt");
            return false;
        }

        if !session.state.resolve(result) {
            log_state_transition!(discarded, session_id, attempt = attempt, "session is not generating");
            return false;
        }

        session.updated_at = Utc::now();
        log_state_transition!(
            session_id,
            from = "generating",
            to = session.state.status(),
            attempt = attempt
        );
        true
    }
}
