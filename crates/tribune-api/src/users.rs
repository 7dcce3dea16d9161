use tribune_types::ops::Op;
use tribune_types::wire::{Request, Response};

use crate::error::{ApiError, ApiResult, required};
use crate::session::Session;
use crate::state::AppStateInner;

/// Returns the caller's own account details.
pub fn get_own_user(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let username = required(&req.user, "user")?;
    state.require_owner(session, &req.token, username)?;

    let user = state
        .db
        .users
        .get(username)
        .ok_or_else(|| ApiError::NotFound("unknown user".into()))?;

    Ok(Response::new(Op::GetOwnUser.success_code()).with_identity(&user.username, &user.nickname, user.role))
}
