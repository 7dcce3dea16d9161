use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock};

use tracing::debug;
use uuid::Uuid;

use tribune_db::IdSequence;
use tribune_types::models::{Role, User};

pub const GUEST_NAME: &str = "guest";

/// Authentication state of one connection. Owned by the connection task;
/// the [`SessionRegistry`] holds a snapshot of it under its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub conn_id: Uuid,
    pub address: SocketAddr,
    /// Username of the logged-in account.
    pub user_id: Option<String>,
    pub display_name: String,
    pub role: Role,
    pub token: Option<String>,
}

impl Session {
    pub fn new(conn_id: Uuid, address: SocketAddr) -> Self {
        Self {
            conn_id,
            address,
            user_id: None,
            display_name: GUEST_NAME.to_string(),
            role: Role::Guest,
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn authenticate(&mut self, user: &User, token: String) {
        self.user_id = Some(user.username.clone());
        self.display_name = user.nickname.clone();
        self.role = user.role;
        self.token = Some(token);
    }

    /// Back to an anonymous guest; the socket stays open.
    pub fn reset(&mut self) {
        self.user_id = None;
        self.display_name = GUEST_NAME.to_string();
        self.role = Role::Guest;
        self.token = None;
    }

    /// Snapshot stored in the registry under this session's token.
    pub fn info(&self) -> Option<SessionInfo> {
        Some(SessionInfo {
            user_id: self.user_id.clone()?,
            display_name: self.display_name.clone(),
            role: self.role,
            address: self.address,
            conn_id: self.conn_id,
        })
    }
}

/// What a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
    pub address: SocketAddr,
    pub conn_id: Uuid,
}

/// Live tokens of authenticated sessions, shared by every connection.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionInfo>>,
    sequence: IdSequence,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            sequence: IdSequence::new(),
        }
    }

    /// Allocates a token: role prefix plus the zero-padded process-wide sequence.
    pub fn issue_token(&self, role: Role) -> String {
        format!("{}{:05}", role.token_prefix(), self.sequence.next())
    }

    pub fn register(&self, token: String, info: SessionInfo) {
        debug!("Token {} registered for {}", token, info.user_id);
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, info);
    }

    pub fn lookup(&self, token: &str) -> Option<SessionInfo> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
    }

    pub fn revoke(&self, token: &str) -> Option<SessionInfo> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
        if removed.is_some() {
            debug!("Token {} revoked", token);
        }
        removed
    }

    /// Revokes every live token of `user_id`. Returns how many were dropped.
    pub fn revoke_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, info| info.user_id != user_id);
        before - sessions.len()
    }

    /// Updates the display name of every live session of `user_id`.
    pub fn rename_user(&self, user_id: &str, display_name: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        for info in sessions.values_mut().filter(|i| i.user_id == user_id) {
            info.display_name = display_name.to_string();
        }
    }

    #[cfg(test)]
    pub(crate) fn tokens_for(&self, user_id: &str) -> Vec<String> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, info)| info.user_id == user_id)
            .map(|(token, _)| token.clone())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn info(user: &str) -> SessionInfo {
        SessionInfo {
            user_id: user.to_string(),
            display_name: format!("{user}nick"),
            role: Role::Member,
            address: addr(),
            conn_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn tokens_encode_role_and_sequence() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.issue_token(Role::Member), "m00001");
        assert_eq!(registry.issue_token(Role::Admin), "a00002");
        assert_eq!(registry.issue_token(Role::Member), "m00003");
    }

    #[test]
    fn concurrent_tokens_never_collide() {
        let registry = Arc::new(SessionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..200).map(|_| registry.issue_token(Role::Member)).collect::<Vec<_>>()
                })
            })
            .collect();
        let mut seen = HashSet::new();
        for h in handles {
            for token in h.join().unwrap() {
                assert!(seen.insert(token));
            }
        }
    }

    #[test]
    fn revoke_removes_lookup() {
        let registry = SessionRegistry::new();
        registry.register("m00001".into(), info("alice01"));
        assert_eq!(registry.lookup("m00001").unwrap().user_id, "alice01");
        assert!(registry.revoke("m00001").is_some());
        assert!(registry.lookup("m00001").is_none());
        assert!(registry.revoke("m00001").is_none());
    }

    #[test]
    fn revoke_user_drops_all_their_tokens() {
        let registry = SessionRegistry::new();
        registry.register("m00001".into(), info("alice01"));
        registry.register("m00002".into(), info("alice01"));
        registry.register("m00003".into(), info("bobby02"));

        assert_eq!(registry.revoke_user("alice01"), 2);
        assert!(registry.tokens_for("alice01").is_empty());
        assert_eq!(registry.tokens_for("bobby02"), vec!["m00003"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rename_reaches_every_session() {
        let registry = SessionRegistry::new();
        registry.register("m00001".into(), info("alice01"));
        registry.register("m00002".into(), info("alice01"));
        registry.rename_user("alice01", "newalice");
        assert_eq!(registry.lookup("m00001").unwrap().display_name, "newalice");
        assert_eq!(registry.lookup("m00002").unwrap().display_name, "newalice");
    }

    #[test]
    fn session_reset_returns_to_guest() {
        let mut session = Session::new(Uuid::new_v4(), addr());
        assert!(session.info().is_none());
        let user = User {
            id: 1,
            username: "alice01".into(),
            password: "pass1234".into(),
            nickname: "alicenick".into(),
            role: Role::Member,
        };
        session.authenticate(&user, "m00001".into());
        assert!(session.is_authenticated());
        assert_eq!(session.info().unwrap().display_name, "alicenick");

        session.reset();
        assert_eq!(session.role, Role::Guest);
        assert_eq!(session.display_name, GUEST_NAME);
        assert!(session.token.is_none());
    }
}
