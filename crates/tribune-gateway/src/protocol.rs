//! Routes decoded requests to their handlers by operation code.

use tracing::{debug, trace};

use tribune_api::{AppStateInner, ApiResult, Session, admin, auth, profile, topics, users};
use tribune_types::ops::{Op, UNKNOWN_OP};
use tribune_types::wire::{Request, Response};

type Handler = fn(&AppStateInner, &mut Session, &Request) -> ApiResult<Response>;

fn handler_for(op: Op) -> Handler {
    match op {
        Op::Login => auth::login,
        Op::GetOwnUser => users::get_own_user,
        Op::Register => auth::register,
        Op::Logout => auth::logout,
        Op::UpdateProfile => profile::change_profile,
        Op::DeleteAccount => profile::delete_account,
        Op::CreateTopic => topics::create_topic,
        Op::Reply => topics::reply,
        Op::GetReplies => topics::get_replies,
        Op::GetTopics => topics::get_topics,
        Op::AdminUpdateUser => admin::admin_update_user,
        Op::AdminDeleteUser => admin::admin_delete_user,
        Op::AdminDeleteMessage => admin::admin_delete_message,
        Op::AdminListUsers => admin::admin_list_users,
    }
}

/// Decodes one request line. Blank lines yield `None`; anything that is not
/// a JSON object is a decode failure.
pub fn decode(line: &str) -> serde_json::Result<Option<Request>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Request::decode(line).map(Some)
}

/// Runs one request against the shared state. Never fails: handler errors
/// become the operation's error record, unknown operations become `999`.
pub fn dispatch(state: &AppStateInner, session: &mut Session, req: &Request) -> Response {
    state.refresh_session(session);

    let Some(code) = req.op.as_deref() else {
        return Response::error(UNKNOWN_OP, "missing operation code");
    };
    let Some(op) = Op::from_code(code) else {
        debug!("{} sent unknown op {:?}", session.address, code);
        return Response::error(UNKNOWN_OP, format!("unknown operation {code}"));
    };

    trace!("{} ({}) -> {}", session.address, session.display_name, op.name());
    match handler_for(op)(state, session, req) {
        Ok(resp) => resp,
        Err(e) => {
            debug!("{} {} failed ({}): {}", session.address, op.name(), e.kind(), e);
            Response::error(op.error_code(), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tribune_api::NullNotifier;
    use tribune_db::Database;
    use uuid::Uuid;

    fn state() -> AppStateInner {
        AppStateInner::new(Database::new(), Arc::new(NullNotifier))
    }

    fn session() -> Session {
        Session::new(Uuid::new_v4(), "127.0.0.1:6000".parse().unwrap())
    }

    fn line(state: &AppStateInner, session: &mut Session, text: &str) -> Response {
        let req = decode(text).unwrap().unwrap();
        dispatch(state, session, &req)
    }

    #[test]
    fn every_op_routes_to_its_own_codes() {
        let state = state();
        for op in Op::ALL {
            let resp = dispatch(&state, &mut session(), &Request::new(op.code()));
            // Empty requests fail everywhere except listing topics.
            if op == Op::GetTopics {
                assert_eq!(resp.op, op.success_code());
            } else {
                assert_eq!(resp.op, op.error_code(), "{}", op.name());
                assert!(resp.msg.is_some());
            }
        }
    }

    #[test]
    fn unknown_and_missing_ops() {
        let state = state();
        let mut s = session();
        assert_eq!(line(&state, &mut s, r#"{"op":"123"}"#).op, "999");
        assert_eq!(line(&state, &mut s, r#"{"user":"alice01"}"#).op, "999");
    }

    #[test]
    fn blank_and_garbage_lines() {
        assert_eq!(decode("   ").unwrap(), None);
        assert!(decode("not json").is_err());
    }

    #[test]
    fn register_login_post_flow() {
        let state = state();
        let mut s = session();
        let resp = line(
            &state,
            &mut s,
            r#"{"op":"010","user":"alice01","pass":"pass1234","nick":"alicenick"}"#,
        );
        assert_eq!(resp.op, "011");

        let resp = line(&state, &mut s, r#"{"op":"000","user":"alice01","pass":"pass1234"}"#);
        assert_eq!(resp.op, "001");
        assert_eq!(resp.token.as_deref(), Some("m00001"));

        let resp = line(
            &state,
            &mut s,
            r#"{"op":"050","title":"Hello there","subject":"General","msg":"Hi everyone!!"}"#,
        );
        assert_eq!(resp.op, "051");
        assert_eq!(resp.topic_id.as_deref(), Some("1"));
    }

    #[test]
    fn login_of_unregistered_user_reports_not_found() {
        let state = state();
        let mut s = session();
        let before = s.clone();
        let resp = line(&state, &mut s, r#"{"op":"000","user":"ghost","pass":"whatever"}"#);
        assert_eq!(resp.op, "002");
        assert!(resp.msg.unwrap().starts_with("not found"));
        assert_eq!(s, before);
    }

    #[test]
    fn revoked_token_resets_session_before_dispatch() {
        let state = state();
        let mut s = session();
        line(&state, &mut s, r#"{"op":"010","user":"alice01","pass":"pass1234","nick":"alicenick"}"#);
        line(&state, &mut s, r#"{"op":"000","user":"alice01","pass":"pass1234"}"#);
        state.sessions.revoke_user("alice01");

        let resp = line(&state, &mut s, r#"{"op":"075"}"#);
        assert_eq!(resp.op, "076");
        assert!(!s.is_authenticated());
    }
}
