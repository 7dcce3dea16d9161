use std::sync::Arc;

use tracing::debug;

use tribune_db::Database;
use tribune_types::models::{Role, UNKNOWN_AUTHOR, User};

use crate::error::{ApiError, ApiResult};
use crate::notify::Notifier;
use crate::session::{Session, SessionInfo, SessionRegistry};

pub type AppState = Arc<AppStateInner>;

/// Stores shared by every connection, passed explicitly to each handler.
pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionRegistry,
    pub notifier: Arc<dyn Notifier>,
}

impl AppStateInner {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            sessions: SessionRegistry::new(),
            notifier,
        }
    }

    /// Drops a session's token if it was revoked elsewhere (e.g. an admin
    /// deleted the account). Returns true if the session was reset.
    pub fn refresh_session(&self, session: &mut Session) -> bool {
        let Some(token) = session.token.as_deref() else {
            return false;
        };
        if self.sessions.lookup(token).is_some() {
            return false;
        }
        debug!("Session on {} lost token {}, back to guest", session.address, token);
        session.reset();
        true
    }

    /// Resolves the request's token, falling back to the connection's own.
    pub(crate) fn resolve_token(
        &self,
        session: &Session,
        supplied: &Option<String>,
    ) -> ApiResult<(String, SessionInfo)> {
        let token = crate::error::optional(supplied)
            .or(session.token.as_deref())
            .ok_or_else(|| ApiError::Unauthorized("not logged in".into()))?;
        let info = self
            .sessions
            .lookup(token)
            .ok_or_else(|| ApiError::Unauthorized("invalid or expired token".into()))?;
        Ok((token.to_string(), info))
    }

    /// Like [`Self::resolve_token`], and the token must belong to `username`.
    pub(crate) fn require_owner(
        &self,
        session: &Session,
        supplied: &Option<String>,
        username: &str,
    ) -> ApiResult<(String, SessionInfo)> {
        let (token, info) = self.resolve_token(session, supplied)?;
        if info.user_id != username {
            return Err(ApiError::Unauthorized("token does not belong to this user".into()));
        }
        Ok((token, info))
    }

    /// The token must resolve to a live session whose account is currently an admin.
    pub(crate) fn require_admin(&self, session: &Session, supplied: &Option<String>) -> ApiResult<User> {
        let denied = || ApiError::Unauthorized("invalid or non-admin token".into());
        let (_, info) = self.resolve_token(session, supplied).map_err(|_| denied())?;
        self.db
            .users
            .get(&info.user_id)
            .filter(|u| u.role == Role::Admin)
            .ok_or_else(denied)
    }

    pub(crate) fn author_name(&self, author_id: u64) -> String {
        self.db
            .users
            .nickname_of(author_id)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }
}
