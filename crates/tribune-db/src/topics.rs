use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;
use tribune_types::models::Topic;

use crate::{IdSequence, read, write};

/// Topics keyed by id. Topics are never removed, only tombstoned.
#[derive(Default)]
pub struct TopicRepo {
    topics: RwLock<BTreeMap<u64, Topic>>,
    ids: IdSequence,
}

impl TopicRepo {
    pub fn create(&self, title: &str, subject: &str, content: &str, author_id: u64) -> Topic {
        // Id assignment happens under the lock so ids and insertion order agree.
        let mut topics = write(&self.topics);
        let topic = Topic {
            id: self.ids.next(),
            title: title.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
            author_id,
            created_at: Utc::now(),
        };
        topics.insert(topic.id, topic.clone());
        debug!("Stored topic {} by user {}", topic.id, author_id);
        topic
    }

    pub fn contains(&self, id: u64) -> bool {
        read(&self.topics).contains_key(&id)
    }

    /// All topics in id order, tombstoned ones included.
    pub fn list(&self) -> Vec<Topic> {
        read(&self.topics).values().cloned().collect()
    }

    /// Replaces the topic's content with the deletion placeholder.
    pub fn tombstone(&self, id: u64) -> Option<Topic> {
        let mut topics = write(&self.topics);
        let topic = topics.get_mut(&id)?;
        topic.tombstone();
        Some(topic.clone())
    }
}
