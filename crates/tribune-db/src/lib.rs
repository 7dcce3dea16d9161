pub mod replies;
pub mod sequence;
pub mod topics;
pub mod users;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

pub use replies::ReplyRepo;
pub use sequence::IdSequence;
pub use topics::TopicRepo;
pub use users::{NewUser, UserRepo};

/// In-memory stores for every entity type. Shared by reference between all
/// connection tasks; each repository synchronizes its own map.
#[derive(Default)]
pub struct Database {
    pub users: UserRepo,
    pub topics: TopicRepo,
    pub replies: ReplyRepo,
}

impl Database {
    pub fn new() -> Self {
        info!("In-memory store initialized");
        Self::default()
    }
}

// A panic while holding a repository lock leaves the map itself intact
// (every mutation is a single insert/remove/field write), so poisoned locks
// are recovered instead of propagated.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
