//! Session registry keyed by (team id, image).

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::Roster;
use tracing::{debug, info};

use crate::domain::errors::ShellError;
use crate::domain::session::{Session, SessionKey};

/// Default frames buffered per pipe.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Live shell sessions.
pub struct ShellRegistry {
    sessions: DashMap<SessionKey, Arc<Session>>,
    roster: Arc<Roster>,
    capacity: usize,
}

impl ShellRegistry {
    pub fn new(roster: Arc<Roster>, capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            roster,
            capacity,
        }
    }

    /// Resolve identifiers against the roster and return the live session,
    /// creating a Pending one if the key is absent or its session is Closed.
    pub fn lookup_or_create(&self, team: &str, image: &str) -> Result<Arc<Session>, ShellError> {
        let key = self.resolve(team, image)?;
        let session = match self.sessions.entry(key) {
            Entry::Occupied(mut slot) => {
                if slot.get().state().is_closed() {
                    debug!(key = %slot.key(), "Replacing closed shell session");
                    let fresh = Arc::new(Session::new(slot.key().clone(), self.capacity));
                    slot.insert(fresh.clone());
                    fresh
                } else {
                    slot.get().clone()
                }
            }
            Entry::Vacant(slot) => {
                debug!(key = %slot.key(), "Creating shell session");
                let fresh = Arc::new(Session::new(slot.key().clone(), self.capacity));
                slot.insert(fresh.clone());
                fresh
            }
        };
        Ok(session)
    }

    /// Attach an operator: Pending → Active.
    ///
    /// Fails with `AlreadyInUse` when another operator holds the session.
    pub fn attach_operator(&self, team: &str, image: &str) -> Result<Arc<Session>, ShellError> {
        let session = self.lookup_or_create(team, image)?;
        if !session.activate() {
            return Err(ShellError::AlreadyInUse {
                team: session.key().team.clone(),
                image: session.key().image.clone(),
            });
        }
        info!(key = %session.key(), "Operator attached to shell");
        Ok(session)
    }

    /// Live (non-Closed) session for a key, if any.
    pub fn get(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions
            .get(key)
            .map(|s| s.value().clone())
            .filter(|s| !s.state().is_closed())
    }

    /// Sessions with an attached operator.
    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.value().state().is_active())
            .count()
    }

    fn resolve(&self, team: &str, image: &str) -> Result<SessionKey, ShellError> {
        let team = self
            .roster
            .resolve_team(team)
            .ok_or_else(|| ShellError::UnknownTeam(team.to_string()))?;
        let image = self
            .roster
            .image(image)
            .ok_or_else(|| ShellError::UnknownImage(image.to_string()))?;
        Ok(SessionKey::new(team.id.clone(), image.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SessionState;
    use crate::test_utils::test_roster;

    fn registry() -> ShellRegistry {
        ShellRegistry::new(Arc::new(test_roster()), 8)
    }

    #[test]
    fn test_lookup_validates_roster() {
        let registry = registry();
        assert_eq!(
            registry.lookup_or_create("nobody", "web01").unwrap_err(),
            ShellError::UnknownTeam("nobody".into())
        );
        assert_eq!(
            registry.lookup_or_create("t1", "mail01").unwrap_err(),
            ShellError::UnknownImage("mail01".into())
        );
    }

    #[test]
    fn test_lookup_returns_same_live_session() {
        let registry = registry();
        let a = registry.lookup_or_create("t1", "web01").unwrap();
        let b = registry.lookup_or_create("t1", "web01").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_alias_maps_to_team_id() {
        let registry = registry();
        let by_alias = registry.lookup_or_create("red-rovers", "web01").unwrap();
        assert_eq!(by_alias.key(), &SessionKey::new("t1", "web01"));
    }

    #[test]
    fn test_second_operator_rejected() {
        let registry = registry();
        registry.attach_operator("t1", "web01").unwrap();
        assert!(matches!(
            registry.attach_operator("t1", "web01"),
            Err(ShellError::AlreadyInUse { .. })
        ));
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_closed_session_is_replaced() {
        let registry = registry();
        let old = registry.attach_operator("t1", "web01").unwrap();
        old.close();
        assert!(registry.get(&SessionKey::new("t1", "web01")).is_none());

        let fresh = registry.attach_operator("t1", "web01").unwrap();
        assert!(!Arc::ptr_eq(&old, &fresh));

        // A stale handle closing again leaves the new session alone.
        old.close();
        assert_eq!(
            fresh.state(),
            SessionState::Active {
                awaiting_target: true
            }
        );
    }
}
