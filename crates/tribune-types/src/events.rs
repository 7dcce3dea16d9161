use crate::models::Topic;
use crate::ops::TOPIC_PUSH;
use crate::wire::Response;

/// Unsolicited notifications pushed to live connections outside the
/// request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// A topic was created. Carries the author's nickname at creation time.
    TopicCreated { topic: Topic, author: String },
}

impl PushEvent {
    pub fn to_response(&self) -> Response {
        match self {
            Self::TopicCreated { topic, author } => Response::new(TOPIC_PUSH).with_topic(topic, author),
        }
    }
}
