//! Simple in-memory session storage.
//!
//! Stores the backend token and all in-progress study state keyed by session
//! ID (from cookie). Sessions auto-expire after a configurable duration of
//! inactivity.

use crate::api::{RequestTicket, RequestTracker};
use crate::config;
use crate::domain::{PracticeRange, Role, SessionUser, UserAccount};
use crate::lesson::LessonState;
use crate::practice::{ExamSession, PracticeSession};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::AbortHandle;

/// Drill served for the lesson's current practice step
#[derive(Debug, Clone)]
pub struct LessonDrill {
  pub subtopic_id: i64,
  pub range: PracticeRange,
  pub session: PracticeSession,
}

/// Stand-alone practice of a whole sub-unit
#[derive(Debug, Clone)]
pub struct SubtopicPractice {
  pub subtopic_id: i64,
  pub topic_id: Option<i64>,
  pub session: PracticeSession,
}

/// Last admin list shown, so the confirm page can name the account
#[derive(Debug, Clone)]
pub struct AdminSnapshot {
  pub role: Role,
  pub search: Option<String>,
  pub users: Vec<UserAccount>,
}

#[derive(Debug, Clone)]
pub struct Session {
  pub token: String,
  pub user: SessionUser,
  pub lesson: Option<LessonState>,
  pub drill: Option<LessonDrill>,
  pub practice: Option<SubtopicPractice>,
  pub exam: Option<ExamSession>,
  pub admin: Option<AdminSnapshot>,
  /// Unit whose test was opened by finishing its last sub-unit in this session
  pub unlocked_test: Option<i64>,
  /// Newest navigation wins
  pub tracker: RequestTracker,
  /// Newest admin list query wins
  pub admin_tracker: RequestTracker,
  pending_load: Option<AbortHandle>,
}

impl Session {
  pub fn new(token: String, user: SessionUser) -> Self {
    Self {
      token,
      user,
      lesson: None,
      drill: None,
      practice: None,
      exam: None,
      admin: None,
      unlocked_test: None,
      tracker: RequestTracker::new(),
      admin_tracker: RequestTracker::new(),
      pending_load: None,
    }
  }
}

/// Session entry with last access time for expiration
struct SessionEntry {
  session: Session,
  last_access: DateTime<Utc>,
}

/// Shared session store; clones see the same sessions.
#[derive(Clone)]
pub struct SessionStore {
  sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
  expiry: Duration,
}

impl SessionStore {
  pub fn new(expiry_hours: i64) -> Self {
    Self {
      sessions: Arc::new(Mutex::new(HashMap::new())),
      expiry: Duration::hours(expiry_hours),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn is_expired(&self, entry: &SessionEntry) -> bool {
    entry.last_access <= Utc::now() - self.expiry
  }

  /// Start a session for a signed-in user and return its ID
  pub fn create(&self, token: String, user: SessionUser) -> String {
    let session_id = generate_session_id();
    self.lock().insert(
      session_id.clone(),
      SessionEntry {
        session: Session::new(token, user),
        last_access: Utc::now(),
      },
    );
    session_id
  }

  /// Mutate a live session in place, refreshing its access time
  pub fn update_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
    let mut sessions = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      self.cleanup_expired(&mut sessions);
    }

    if sessions.get(session_id).is_some_and(|entry| self.is_expired(entry)) {
      tracing::debug!("Session expired");
      sessions.remove(session_id);
      return None;
    }
    let entry = sessions.get_mut(session_id)?;
    entry.last_access = Utc::now();
    Some(f(&mut entry.session))
  }

  pub fn remove(&self, session_id: &str) -> bool {
    let removed = self.lock().remove(session_id);
    if let Some(pending) = removed.as_ref().and_then(|e| e.session.pending_load.as_ref()) {
      pending.abort();
    }
    removed.is_some()
  }

  /// Register a lesson load for the session. The load it replaces, if still
  /// running, is aborted; the returned ticket tells whether this one is
  /// still the newest when it finishes.
  pub fn begin_load(&self, session_id: &str, handle: AbortHandle) -> Option<RequestTicket> {
    self.update_session(session_id, |session| {
      if let Some(previous) = session.pending_load.replace(handle) {
        if !previous.is_finished() {
          tracing::debug!("Aborting superseded lesson load");
          previous.abort();
        }
      }
      session.tracker.begin()
    })
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Clean up expired sessions
  fn cleanup_expired(&self, sessions: &mut HashMap<String, SessionEntry>) {
    let cutoff = Utc::now() - self.expiry;
    sessions.retain(|_, entry| entry.last_access > cutoff);
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
