//! Request handlers for the forum protocol.
//!
//! Handlers are synchronous and perform no I/O: each takes the shared
//! [`AppStateInner`], the calling connection's [`Session`] and the decoded
//! request, and returns either a success record or an [`ApiError`].
//! Broadcasts leave through the [`Notifier`] seam.

pub mod admin;
pub mod auth;
pub mod error;
pub mod notify;
pub mod profile;
pub mod session;
pub mod state;
pub mod topics;
pub mod users;
pub mod validation;

pub use error::{ApiError, ApiResult};
pub use notify::{Notifier, NullNotifier};
pub use session::{Session, SessionInfo, SessionRegistry};
pub use state::{AppState, AppStateInner};

#[cfg(test)]
pub(crate) mod testing;
