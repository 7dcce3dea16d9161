//! Newline-delimited records exchanged with clients.
//!
//! Every record is a single JSON object on one line. Scalar fields are
//! strings; `msg_list` and `user_list` carry arrays.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Reply, Role, Topic};

/// An incoming request. Unknown fields are ignored, absent ones are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Request {
    pub op: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub token: Option<String>,
    pub msg: Option<String>,
    pub nick: Option<String>,
    pub new_nick: Option<String>,
    pub new_pass: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub topic_id: Option<String>,
}

impl Request {
    pub fn new(op: &str) -> Self {
        Self {
            op: Some(op.to_string()),
            ..Self::default()
        }
    }

    pub fn decode(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

/// Ids are strings on the wire, but clients that send bare numbers are accepted.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// An outgoing record: a response to a request or an unsolicited push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_list: Option<Vec<ListEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_list: Option<Vec<String>>,
}

impl Response {
    pub fn new(op: &str) -> Self {
        Self {
            op: op.to_string(),
            ..Self::default()
        }
    }

    pub fn error(op: &str, reason: impl Into<String>) -> Self {
        Self::new(op).with_msg(reason)
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_identity(mut self, username: &str, nickname: &str, role: Role) -> Self {
        self.user = Some(username.to_string());
        self.nick = Some(nickname.to_string());
        self.role = Some(role.as_str().to_string());
        self
    }

    /// Fills the `topic_*` fields from a stored topic.
    pub fn with_topic(mut self, topic: &Topic, author: &str) -> Self {
        self.topic_id = Some(topic.id.to_string());
        self.topic_title = Some(topic.title.clone());
        self.topic_subject = Some(topic.subject.clone());
        self.topic_content = Some(topic.content.clone());
        self.topic_author = Some(author.to_string());
        self
    }

    pub fn encode(&self) -> String {
        // Only strings and string lists: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

/// One element of `msg_list`: either a reply or a topic summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_content: Option<String>,
}

impl ListEntry {
    pub fn reply(reply: &Reply, author: &str) -> Self {
        Self {
            id: Some(reply.id.to_string()),
            nick: Some(author.to_string()),
            msg: Some(reply.content.clone()),
            ..Self::default()
        }
    }

    pub fn topic(topic: &Topic, author: &str) -> Self {
        Self {
            topic_id: Some(topic.id.to_string()),
            topic_title: Some(topic.title.clone()),
            topic_subject: Some(topic.subject.clone()),
            topic_author: Some(author.to_string()),
            topic_content: Some(topic.content.clone()),
            ..Self::default()
        }
    }
}
