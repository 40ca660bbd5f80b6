//! Registry of live sessions.
//!
//! Sessions are created on first contact and kept in recency order. Each one
//! sits behind an async mutex: a dispatcher holds the lock for the whole
//! event, so events of one user are handled one at a time even across
//! transport awaits.

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::clock::Clock;
use crate::types::UserId;
use super::Session;

/// Shared, lockable session.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// When sessions may be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Drop sessions unseen for this long. `None` keeps them forever.
    pub idle_ttl: Option<Duration>,
    /// Soft upper bound on the number of sessions kept.
    pub capacity: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            idle_ttl: None,
            capacity: 10_000,
        }
    }
}

struct Slot {
    session: SessionHandle,
    last_seen: DateTime<Utc>,
}

/// Sessions keyed by user id.
pub struct SessionRegistry {
    slots: Mutex<LruCache<UserId, Slot>>,
    clock: Arc<dyn Clock>,
    policy: EvictionPolicy,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(clock: Arc<dyn Clock>, policy: EvictionPolicy) -> Self {
        Self {
            slots: Mutex::new(LruCache::unbounded()),
            clock,
            policy,
        }
    }

    /// The session of `user`, created if missing. Marks it as seen now.
    pub fn session(&self, user: UserId) -> SessionHandle {
        let now = self.clock.now();
        let mut slots = self.slots.lock();

        let handle = match slots.get_mut(&user) {
            Some(slot) => {
                slot.last_seen = now;
                Arc::clone(&slot.session)
            }
            None => {
                tracing::debug!(user_id = %user, "session created");
                let session = Arc::new(tokio::sync::Mutex::new(Session::new()));
                slots.put(
                    user,
                    Slot {
                        session: Arc::clone(&session),
                        last_seen: now,
                    },
                );
                session
            }
        };

        Self::evict(&mut slots, &self.policy, now);
        handle
    }

    /// Drop sessions that are idle past the ttl or beyond capacity.
    ///
    /// Sessions currently held by a dispatcher are never dropped.
    pub fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        Self::evict(&mut self.slots.lock(), &self.policy, now)
    }

    /// Whether `user` has a live session.
    pub fn contains(&self, user: UserId) -> bool {
        self.slots.lock().contains(&user)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn evict(slots: &mut LruCache<UserId, Slot>, policy: &EvictionPolicy, now: DateTime<Utc>) -> usize {
        let mut remaining = slots.len();
        let mut doomed = Vec::new();

        // Least recently seen first.
        for (user, slot) in slots.iter().rev() {
            let over_capacity = remaining > policy.capacity;
            let idle = policy
                .idle_ttl
                .is_some_and(|ttl| now - slot.last_seen >= ttl);
            if !over_capacity && !idle {
                break;
            }
            if Arc::strong_count(&slot.session) > 1 {
                continue;
            }
            doomed.push(*user);
            remaining -= 1;
        }

        for user in &doomed {
            slots.pop(user);
            tracing::debug!(user_id = %user, "session evicted");
        }
        doomed.len()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .field("policy", &self.policy)
            .finish()
    }
}
