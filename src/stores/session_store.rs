use dashmap::DashMap;

/// A logged-in browser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: u32,
    /// Unix seconds
    pub expires_at: i64,
}

/// In-memory session table keyed by the opaque cookie token
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl_seconds: i64,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_seconds,
        }
    }

    /// Start a session for `user_id` and return its token
    pub fn create(&self, user_id: u32, now: i64) -> String {
        let token = hex::encode(rand::random::<[u8; 32]>());
        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: now.saturating_add(self.ttl_seconds),
            },
        );
        token
    }

    /// Resolve a token to a user id. Expired sessions are dropped on sight.
    pub fn resolve(&self, token: &str, now: i64) -> Option<u32> {
        let session = *self.sessions.get(token)?.value();
        if session.expires_at <= now {
            self.sessions.remove(token);
            return None;
        }
        Some(session.user_id)
    }

    pub fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    /// End every session belonging to `user_id`
    pub fn revoke_user(&self, user_id: u32) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.user_id != user_id);
        before.saturating_sub(self.sessions.len())
    }

    /// Drop every expired session and return how many were removed
    pub fn cleanup_expired(&self, now: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let store = SessionStore::new(3600);
        let token = store.create(7, 1000);

        assert_eq!(token.len(), 64);
        assert_eq!(store.resolve(&token, 1000), Some(7));
        assert_eq!(store.resolve(&token, 4599), Some(7));
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = SessionStore::new(3600);
        let a = store.create(1, 0);
        let b = store.create(1, 0);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let store = SessionStore::new(60);
        let token = store.create(3, 1000);

        assert_eq!(store.resolve(&token, 1060), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_token() {
        let store = SessionStore::new(60);
        assert_eq!(store.resolve("deadbeef", 0), None);
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(60);
        let token = store.create(3, 0);
        assert_eq!(store.remove(&token).map(|s| s.user_id), Some(3));
        assert_eq!(store.resolve(&token, 1), None);
        assert!(store.remove(&token).is_none());
    }

    #[test]
    fn test_revoke_user() {
        let store = SessionStore::new(100);
        let a = store.create(1, 0);
        let b = store.create(1, 0);
        let other = store.create(2, 0);

        assert_eq!(store.revoke_user(1), 2);
        assert_eq!(store.resolve(&a, 1), None);
        assert_eq!(store.resolve(&b, 1), None);
        assert_eq!(store.resolve(&other, 1), Some(2));
    }

    #[test]
    fn test_cleanup_expired() {
        let store = SessionStore::new(100);
        store.create(1, 0);
        store.create(2, 50);
        store.create(3, 500);

        assert_eq!(store.cleanup_expired(160), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.cleanup_expired(160), 0);
    }

    #[test]
    fn test_huge_ttl_does_not_wrap() {
        let store = SessionStore::new(i64::MAX);
        let token = store.create(3, 1_700_000_000);
        assert_eq!(store.resolve(&token, 1_700_000_001), Some(3));
        assert_eq!(store.cleanup_expired(1_700_000_001), 0);
    }
}
