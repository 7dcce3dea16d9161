use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;
use tribune_types::models::Reply;

use crate::{IdSequence, read, write};

/// Replies grouped by topic. Reply ids come from one sequence shared by all
/// topics, so an id identifies a reply across the whole store.
#[derive(Default)]
pub struct ReplyRepo {
    by_topic: RwLock<HashMap<u64, Vec<Reply>>>,
    ids: IdSequence,
}

impl ReplyRepo {
    /// Appends a reply. The caller is responsible for checking that the topic exists.
    pub fn append(&self, topic_id: u64, author_id: u64, content: &str) -> Reply {
        // Timestamp taken under the lock: a topic's list is already in creation order.
        let mut by_topic = write(&self.by_topic);
        let reply = Reply {
            id: self.ids.next(),
            topic_id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        by_topic.entry(topic_id).or_default().push(reply.clone());
        debug!("Stored reply {} on topic {}", reply.id, topic_id);
        reply
    }

    /// Replies to a topic, ascending by creation time (id breaks ties).
    pub fn for_topic(&self, topic_id: u64) -> Vec<Reply> {
        let mut replies = read(&self.by_topic)
            .get(&topic_id)
            .cloned()
            .unwrap_or_default();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        replies
    }

    /// Replaces the reply's content with the deletion placeholder, searching every topic.
    pub fn tombstone(&self, id: u64) -> Option<Reply> {
        let mut by_topic = write(&self.by_topic);
        let reply = by_topic.values_mut().flatten().find(|r| r.id == id)?;
        reply.tombstone();
        Some(reply.clone())
    }
}
