//! Fixtures shared by the handler tests.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use tribune_db::Database;
use tribune_types::events::PushEvent;
use tribune_types::ops::Op;
use tribune_types::wire::Request;

use crate::notify::Notifier;
use crate::session::Session;
use crate::state::{AppState, AppStateInner};
use crate::auth;

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(Uuid, PushEvent)>>,
}

impl RecordingNotifier {
    pub fn taken(&self) -> Vec<(Uuid, PushEvent)> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn broadcast(&self, origin: Uuid, event: PushEvent) {
        self.events.lock().unwrap().push((origin, event));
    }
}

pub fn state() -> (AppState, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = Arc::new(AppStateInner::new(Database::new(), notifier.clone()));
    (state, notifier)
}

pub fn guest() -> Session {
    Session::new(Uuid::new_v4(), "127.0.0.1:50000".parse().unwrap())
}

pub fn request(op: Op) -> Request {
    Request::new(op.code())
}

pub fn register(state: &AppState, user: &str, pass: &str, nick: &str) {
    let mut req = request(Op::Register);
    req.user = Some(user.into());
    req.pass = Some(pass.into());
    req.nick = Some(nick.into());
    auth::register(state, &mut guest(), &req).unwrap();
}

pub fn admin(state: &AppState, user: &str, pass: &str) {
    auth::seed_admin(state, user, pass, &format!("{user}nick")).unwrap();
}

/// Logs `session` in and returns its token.
pub fn login(state: &AppState, session: &mut Session, user: &str, pass: &str) -> String {
    let mut req = request(Op::Login);
    req.user = Some(user.into());
    req.pass = Some(pass.into());
    auth::login(state, session, &req).unwrap().token.unwrap()
}
