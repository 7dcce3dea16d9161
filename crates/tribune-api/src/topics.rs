use std::collections::HashMap;

use tracing::{debug, info};

use tribune_types::events::PushEvent;
use tribune_types::ops::Op;
use tribune_types::wire::{ListEntry, Request, Response};

use crate::error::{ApiError, ApiResult, required};
use crate::session::Session;
use crate::state::AppStateInner;
use crate::validation::{CONTENT, SUBJECT, TITLE};

/// Ids are decimal strings on the wire; anything else cannot name a topic.
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<u64> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("no {what} with id {raw}")))
}

pub fn create_topic(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let (_, info) = state.resolve_token(session, &req.token)?;
    let title = required(&req.title, "title")?;
    let subject = required(&req.subject, "subject")?;
    let content = required(&req.msg, "msg")?;

    TITLE.check(title)?;
    SUBJECT.check(subject)?;
    CONTENT.check(content)?;

    let author = state
        .db
        .users
        .get(&info.user_id)
        .ok_or_else(|| ApiError::Unauthorized("account no longer exists".into()))?;

    let topic = state.db.topics.create(title, subject, content, author.id);
    info!("{} created topic {} \"{}\"", author.username, topic.id, topic.title);

    let topic_id = topic.id.to_string();
    state.notifier.broadcast(
        session.conn_id,
        PushEvent::TopicCreated {
            topic,
            author: author.nickname,
        },
    );

    let mut resp = Response::new(Op::CreateTopic.success_code()).with_msg("topic created");
    resp.topic_id = Some(topic_id);
    Ok(resp)
}

pub fn reply(state: &AppStateInner, session: &mut Session, req: &Request) -> ApiResult<Response> {
    let (_, info) = state.resolve_token(session, &req.token)?;
    let raw_topic = required(&req.topic_id, "topic_id")?;
    let content = required(&req.msg, "msg")?;
    CONTENT.check(content)?;

    let topic_id = parse_id(raw_topic, "topic")?;
    if !state.db.topics.contains(topic_id) {
        return Err(ApiError::NotFound(format!("no topic with id {topic_id}")));
    }

    let author = state
        .db
        .users
        .get(&info.user_id)
        .ok_or_else(|| ApiError::Unauthorized("account no longer exists".into()))?;

    let reply = state.db.replies.append(topic_id, author.id, content);
    debug!("{} replied {} on topic {}", author.username, reply.id, topic_id);

    let mut resp = Response::new(Op::Reply.success_code()).with_msg("reply posted");
    resp.id = Some(reply.id.to_string());
    resp.topic_id = Some(topic_id.to_string());
    Ok(resp)
}

/// Replies of one topic, oldest first. Open to guests.
pub fn get_replies(state: &AppStateInner, _session: &mut Session, req: &Request) -> ApiResult<Response> {
    let raw_topic = required(&req.topic_id, "topic_id")?;
    let topic_id = parse_id(raw_topic, "topic")?;
    if !state.db.topics.contains(topic_id) {
        return Err(ApiError::NotFound(format!("no topic with id {topic_id}")));
    }

    let mut authors = HashMap::new();
    let entries = state
        .db
        .replies
        .for_topic(topic_id)
        .iter()
        .map(|reply| {
            let author = authors
                .entry(reply.author_id)
                .or_insert_with(|| state.author_name(reply.author_id));
            ListEntry::reply(reply, author)
        })
        .collect();

    let mut resp = Response::new(Op::GetReplies.success_code());
    resp.topic_id = Some(topic_id.to_string());
    resp.msg_list = Some(entries);
    Ok(resp)
}

/// Every topic, tombstoned ones included. Open to guests.
pub fn get_topics(state: &AppStateInner, _session: &mut Session, _req: &Request) -> ApiResult<Response> {
    let mut authors = HashMap::new();
    let entries = state
        .db
        .topics
        .list()
        .iter()
        .map(|topic| {
            let author = authors
                .entry(topic.author_id)
                .or_insert_with(|| state.author_name(topic.author_id));
            ListEntry::topic(topic, author)
        })
        .collect();

    let mut resp = Response::new(Op::GetTopics.success_code());
    resp.msg_list = Some(entries);
    Ok(resp)
}
