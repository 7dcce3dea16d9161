use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content written over a topic or reply removed by an administrator.
pub const TOMBSTONE: &str = "[deleted by moderator]";

/// Nickname shown for content whose author no longer exists.
pub const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Member,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    /// Leading character of tokens issued to this role.
    pub fn token_prefix(self) -> char {
        match self {
            Role::Admin => 'a',
            _ => 'm',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account. Passwords are stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub title: String,
    pub subject: String,
    pub content: String,
    pub author_id: u64,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn tombstone(&mut self) {
        self.content = TOMBSTONE.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    pub topic_id: u64,
    pub author_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    pub fn tombstone(&mut self) {
        self.content = TOMBSTONE.to_string();
    }
}
