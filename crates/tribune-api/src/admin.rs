//! Moderation operations. Every handler first requires a token whose
//! account is currently an administrator.

use tracing::{info, warn};

use tribune_types::models::{Role, User};
use tribune_types::ops::Op;
use tribune_types::wire::{Request, Response};

use crate::error::{ApiError, ApiResult, required};
use crate::profile::{ProfileEdit, describe_changes};
use crate::session::Session;
use crate::state::AppStateInner;
use crate::topics::parse_id;

fn self_target() -> ApiError {
    ApiError::Unauthorized("administrators cannot target their own account".into())
}

fn admin_target() -> ApiError {
    ApiError::Unauthorized("administrators cannot target another administrator".into())
}

/// Rejects targets that must not be touched. Runs again inside the
/// repository lock, so a concurrent promotion cannot slip in between.
fn guard_target(admin: &User, target: &User) -> ApiResult<()> {
    if target.id == admin.id {
        return Err(self_target());
    }
    if target.role == Role::Admin {
        return Err(admin_target());
    }
    Ok(())
}

/// Authorization comes before field validation: a guarded target is refused
/// no matter what the rest of the request contains.
fn check_target(state: &AppStateInner, admin: &User, target: &str) -> ApiResult<()> {
    if target == admin.username {
        return Err(self_target());
    }
    match state.db.users.get(target) {
        Some(user) => guard_target(admin, &user),
        None => Ok(()),
    }
}

pub fn admin_update_user(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let admin = state.require_admin(session, &req.token)?;
    let target = required(&req.user, "user")?;
    check_target(state, &admin, target)?;
    let edit = ProfileEdit::from_request(req)?;

    let changed = state
        .db
        .users
        .modify(target, |user| {
            guard_target(&admin, user)?;
            Ok(edit.apply(user))
        })
        .ok_or_else(|| ApiError::NotFound("unknown user".into()))??;

    if changed.contains(&"nickname") {
        if let Some(nick) = edit.nickname {
            state.sessions.rename_user(target, nick);
        }
    }

    if !changed.is_empty() {
        info!("Admin {} updated {}: {}", admin.username, target, changed.join(", "));
    }
    Ok(Response::new(Op::AdminUpdateUser.success_code()).with_msg(describe_changes(&changed)))
}

pub fn admin_delete_user(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let admin = state.require_admin(session, &req.token)?;
    let target = required(&req.user, "user")?;
    check_target(state, &admin, target)?;

    state
        .db
        .users
        .remove_if(target, |user| guard_target(&admin, user))
        .ok_or_else(|| ApiError::NotFound("unknown user".into()))??;

    let revoked = state.sessions.revoke_user(target);
    warn!("Admin {} deleted user {} ({} sessions revoked)", admin.username, target, revoked);
    Ok(Response::new(Op::AdminDeleteUser.success_code()).with_msg(format!("user {target} deleted")))
}

/// Tombstones a topic or, failing that, a reply with the given id.
pub fn admin_delete_message(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let admin = state.require_admin(session, &req.token)?;
    let raw = required(&req.id, "id")?;
    let id = parse_id(raw, "topic or reply")?;

    if state.db.topics.tombstone(id).is_some() {
        warn!("Admin {} deleted topic {}", admin.username, id);
        return Ok(Response::new(Op::AdminDeleteMessage.success_code()).with_msg(format!("topic {id} deleted")));
    }
    if let Some(reply) = state.db.replies.tombstone(id) {
        warn!("Admin {} deleted reply {} on topic {}", admin.username, id, reply.topic_id);
        return Ok(Response::new(Op::AdminDeleteMessage.success_code()).with_msg(format!("reply {id} deleted")));
    }
    Err(ApiError::NotFound(format!("no topic or reply with id {id}")))
}

pub fn admin_list_users(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    state.require_admin(session, &req.token)?;
    let mut resp = Response::new(Op::AdminListUsers.success_code());
    resp.user_list = Some(state.db.users.usernames());
    Ok(resp)
}
