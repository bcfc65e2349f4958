//! TTL-based store of planning sessions.
//!
//! A session owns the schedule a user is editing. The schedule is created by a
//! generation request and then only changed through this store, one edit at a
//! time.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use crate::schedule::{Preferences, ScheduleResult};

/// Opaque identifier handed to clients.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a fresh random session key.
    ///
    /// Random bytes are hashed so the key has a fixed shape regardless of the
    /// generator.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);

        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        let result = hasher.finalize();
        // Use first 16 bytes as hex string
        Self(hex::encode(&result[..16]))
    }

    /// Wraps a key received from a client.
    pub fn from_client(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show first 8 chars in logs
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

/// The state owned by one planning session.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSession {
    pub preferences: Preferences,
    pub schedule: ScheduleResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanSession {
    pub fn new(preferences: Preferences, schedule: ScheduleResult) -> Self {
        let now = Utc::now();
        Self {
            preferences,
            schedule,
            created_at: now,
            updated_at: now,
        }
    }
}

struct StoredSession {
    session: PlanSession,
    last_access: Instant,
}

impl StoredSession {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_access.elapsed() >= ttl
    }
}

/// Thread-safe session store.
///
/// Sessions expire after `ttl` without access.
pub struct SessionStore {
    entries: DashMap<SessionKey, StoredSession>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Creates a store with a one-hour TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }

    /// Stores a new session and returns its key.
    pub fn create(&self, session: PlanSession) -> SessionKey {
        let key = SessionKey::generate();
        self.entries.insert(
            key.clone(),
            StoredSession {
                session,
                last_access: Instant::now(),
            },
        );
        key
    }

    /// Returns a copy of the session if it exists and hasn't expired.
    pub fn get(&self, key: &SessionKey) -> Option<PlanSession> {
        self.update(key, |session| session.clone())
    }

    /// Runs `f` on the session while holding its entry exclusively.
    ///
    /// Concurrent edits of the same session are applied one after another.
    pub fn update<F, R>(&self, key: &SessionKey, f: F) -> Option<R>
    where
        F: FnOnce(&mut PlanSession) -> R,
    {
        let mut entry = self.entries.get_mut(key)?;
        if entry.is_expired(self.ttl) {
            drop(entry);
            self.entries.remove(key);
            return None;
        }

        entry.last_access = Instant::now();
        Some(f(&mut entry.session))
    }

    /// Replaces the schedule and preferences of an existing session.
    pub fn replace(&self, key: &SessionKey, session: PlanSession) -> bool {
        self.update(key, |current| {
            let created_at = current.created_at;
            *current = session;
            current.created_at = created_at;
        })
        .is_some()
    }

    pub fn remove(&self, key: &SessionKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns the number of sessions (including expired ones).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes expired sessions.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> SessionStats {
        let mut total = 0;
        let mut expired = 0;

        for entry in self.entries.iter() {
            total += 1;
            if entry.is_expired(self.ttl) {
                expired += 1;
            }
        }

        SessionStats {
            total_sessions: total,
            expired_sessions: expired,
            active_sessions: total - expired,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

/// Session statistics for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub expired_sessions: usize,
    pub active_sessions: usize,
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ClassSection;

    fn session() -> PlanSession {
        PlanSession::new(Preferences::with_units(15), ScheduleResult::default())
    }

    #[test]
    fn test_session_keys_are_unique() {
        let key1 = SessionKey::generate();
        let key2 = SessionKey::generate();

        assert_ne!(key1, key2);
        assert_eq!(key1.as_str().len(), 32);
        assert_eq!(SessionKey::from_client(&key1.as_str().to_uppercase()), key1);
    }

    #[test]
    fn test_update_edits_in_place() {
        let store = SessionStore::default();
        let key = store.create(session());

        let section = ClassSection {
            course_id: "CPSC 131".to_string(),
            title: String::new(),
            units: 3,
            section: "01".to_string(),
            crn: "12345".to_string(),
            professor: None,
            meetings: Vec::new(),
        };
        let outcome = store
            .update(&key, |s| s.schedule.add_section(section))
            .unwrap()
            .unwrap();

        assert_eq!(outcome.planned_units, 3);
        assert_eq!(store.get(&key).unwrap().schedule.planned_units, 3);
    }

    #[test]
    fn test_unknown_session() {
        let store = SessionStore::default();
        assert!(store.get(&SessionKey::from_client("missing")).is_none());
        assert!(!store.remove(&SessionKey::from_client("missing")));
    }

    #[test]
    fn test_expired_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        let key = store.create(session());

        assert_eq!(store.stats().expired_sessions, 1);
        assert!(store.get(&key).is_none());
        assert!(store.is_empty());

        store.create(session());
        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_replace_keeps_creation_time() {
        let store = SessionStore::default();
        let key = store.create(session());
        let created_at = store.get(&key).unwrap().created_at;

        assert!(store.replace(&key, PlanSession::new(Preferences::with_units(9), ScheduleResult::default())));
        let replaced = store.get(&key).unwrap();
        assert_eq!(replaced.preferences.preferred_units, 9);
        assert_eq!(replaced.created_at, created_at);
    }
}
