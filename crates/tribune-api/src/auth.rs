use tracing::info;

use tribune_db::NewUser;
use tribune_types::models::{Role, User};
use tribune_types::ops::Op;
use tribune_types::wire::{Request, Response};

use crate::error::{ApiError, ApiResult, required};
use crate::session::Session;
use crate::state::AppStateInner;
use crate::validation::{NICKNAME, PASSWORD, USERNAME};

pub fn login(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let username = required(&req.user, "user")?;
    let password = required(&req.pass, "pass")?;

    // An ill-formed username can never have been registered, so it falls
    // through to "unknown user" rather than a format error.
    let user = state
        .db
        .users
        .get(username)
        .ok_or_else(|| ApiError::NotFound("unknown user".into()))?;
    if user.password != password {
        return Err(ApiError::Unauthorized("wrong password".into()));
    }

    // Re-login on the same connection replaces the previous token.
    if let Some(old) = session.token.take() {
        state.sessions.revoke(&old);
    }

    let token = state.sessions.issue_token(user.role);
    session.authenticate(&user, token.clone());
    if let Some(snapshot) = session.info() {
        state.sessions.register(token.clone(), snapshot);
    }

    info!("{} ({}) logged in from {}", user.username, user.role, session.address);

    let mut resp = Response::new(Op::Login.success_code()).with_identity(&user.username, &user.nickname, user.role);
    resp.token = Some(token);
    Ok(resp)
}

pub fn register(state: &AppStateInner, _session: &mut Session, req: &Request) -> ApiResult<Response> {
    let username = required(&req.user, "user")?;
    let nickname = required(&req.nick, "nick")?;
    let password = required(&req.pass, "pass")?;

    USERNAME.check(username)?;
    NICKNAME.check(nickname)?;
    PASSWORD.check(password)?;

    let user = insert_user(state, username, password, nickname, Role::Member)?;
    info!("Registered {} (id {})", user.username, user.id);

    let mut resp = Response::new(Op::Register.success_code()).with_msg("registration successful");
    resp.user = Some(user.username);
    Ok(resp)
}

pub fn logout(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let username = required(&req.user, "user")?;
    let (token, _) = state.require_owner(session, &req.token, username)?;

    state.sessions.revoke(&token);
    if session.token.as_deref() == Some(token.as_str()) {
        session.reset();
    }

    info!("{} logged out ({})", username, token);
    Ok(Response::new(Op::Logout.success_code()).with_msg("logged out"))
}

/// Creates an administrator account. Administrators cannot be registered
/// over the wire, so the server seeds them from configuration.
pub fn seed_admin(state: &AppStateInner, username: &str, password: &str, nickname: &str) -> ApiResult<User> {
    USERNAME.check(username)?;
    NICKNAME.check(nickname)?;
    PASSWORD.check(password)?;

    let user = insert_user(state, username, password, nickname, Role::Admin)?;
    info!("Seeded administrator {} (id {})", user.username, user.id);
    Ok(user)
}

fn insert_user(state: &AppStateInner, username: &str, password: &str, nickname: &str, role: Role) -> ApiResult<User> {
    state
        .db
        .users
        .insert(NewUser {
            username: username.to_string(),
            password: password.to_string(),
            nickname: nickname.to_string(),
            role,
        })
        .ok_or_else(|| ApiError::Conflict(format!("username {username} is already taken")))
}
