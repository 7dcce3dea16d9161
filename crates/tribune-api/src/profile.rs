use tracing::info;

use tribune_types::ops::Op;
use tribune_types::wire::{Request, Response};

use crate::error::{ApiError, ApiResult, optional, required};
use crate::session::Session;
use crate::state::AppStateInner;
use crate::validation::{NICKNAME, PASSWORD};

/// Requested nickname/password changes, validated but not yet applied.
pub(crate) struct ProfileEdit<'a> {
    pub nickname: Option<&'a str>,
    pub password: Option<&'a str>,
}

impl<'a> ProfileEdit<'a> {
    pub(crate) fn from_request(req: &'a Request) -> ApiResult<Self> {
        let edit = Self {
            nickname: optional(&req.new_nick),
            password: optional(&req.new_pass),
        };
        if edit.nickname.is_none() && edit.password.is_none() {
            return Err(ApiError::Malformed("supply `new_nick` and/or `new_pass`".into()));
        }
        if let Some(nick) = edit.nickname {
            NICKNAME.check(nick)?;
        }
        if let Some(pass) = edit.password {
            PASSWORD.check(pass)?;
        }
        Ok(edit)
    }

    /// Applies the fields that differ from the stored values and names them.
    pub(crate) fn apply(&self, user: &mut tribune_types::models::User) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(nick) = self.nickname.filter(|n| *n != user.nickname) {
            user.nickname = nick.to_string();
            changed.push("nickname");
        }
        if let Some(pass) = self.password.filter(|p| *p != user.password) {
            user.password = pass.to_string();
            changed.push("password");
        }
        changed
    }
}

/// Summary sent back for an update; an update that changes nothing still succeeds.
pub(crate) fn describe_changes(changed: &[&str]) -> String {
    if changed.is_empty() {
        "no changes".to_string()
    } else {
        format!("updated {}", changed.join(" and "))
    }
}

pub fn change_profile(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let username = required(&req.user, "user")?;
    let current = required(&req.pass, "pass")?;
    state.require_owner(session, &req.token, username)?;
    let edit = ProfileEdit::from_request(req)?;

    let changed = state
        .db
        .users
        .modify(username, |user| {
            if user.password != current {
                return Err(ApiError::Unauthorized("wrong password".into()));
            }
            Ok(edit.apply(user))
        })
        .ok_or_else(|| ApiError::NotFound("unknown user".into()))??;

    if changed.contains(&"nickname") {
        if let Some(nick) = edit.nickname {
            state.sessions.rename_user(username, nick);
            if session.user_id.as_deref() == Some(username) {
                session.display_name = nick.to_string();
            }
        }
    }

    if !changed.is_empty() {
        info!("{} updated own profile: {}", username, changed.join(", "));
    }
    Ok(Response::new(Op::UpdateProfile.success_code()).with_msg(describe_changes(&changed)))
}

pub fn delete_account(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let username = required(&req.user, "user")?;
    let password = required(&req.pass, "pass")?;
    state.require_owner(session, &req.token, username)?;

    state
        .db
        .users
        .remove_if(username, |user| {
            if user.password != password {
                return Err(ApiError::Unauthorized("wrong password".into()));
            }
            Ok(())
        })
        .ok_or_else(|| ApiError::NotFound("unknown user".into()))??;

    let revoked = state.sessions.revoke_user(username);
    if session.user_id.as_deref() == Some(username) {
        session.reset();
    }

    info!("{} deleted own account ({} sessions revoked)", username, revoked);
    Ok(Response::new(Op::DeleteAccount.success_code()).with_msg("account deleted"))
}
