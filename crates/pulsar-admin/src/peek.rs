// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peeking messages from a subscription backlog.
//!
//! The broker serves one backlog entry per request, addressed by a 1-based
//! position. An entry holds one message or a whole batch, so the number of
//! requests needed for N messages is not known up front.
//!
//! - [`peek_nth_message`] fetches and decodes one position
//! - [`PeekCursor`] walks positions lazily, one request at a time
//! - [`peek_messages`] collects at least N messages, all-or-nothing

use crate::error::Result;
use crate::message::Message;
use crate::response::{interpret_response, PeekedEntry};
use crate::topic::TopicName;
use crate::transport::{send, AdminRequest, AdminTransport};
use std::collections::VecDeque;

/// Path of the "peek Nth message" endpoint.
pub fn position_path(topic: &TopicName, subscription: &str, position: u64) -> Vec<String> {
    let mut path = topic.rest_path();
    path.extend([
        "subscription".to_string(),
        subscription.to_string(),
        "position".to_string(),
        position.to_string(),
    ]);
    path
}

/// Fetch and decode the entry at a backlog position.
pub fn peek_nth_message<T>(
    transport: &T,
    topic: &TopicName,
    subscription: &str,
    position: u64,
) -> Result<PeekedEntry>
where
    T: AdminTransport + ?Sized,
{
    let request = AdminRequest::get(position_path(topic, subscription, position));
    let response = send(transport, request)?;
    interpret_response(&topic.to_string(), response)
}

/// Lazy walk over a subscription backlog.
///
/// Each call to [`next_entry`](Self::next_entry) issues exactly one request
/// and advances the position by one. The iterator flattens entries into
/// messages and stops after the first error.
pub struct PeekCursor<'a, T: AdminTransport + ?Sized> {
    transport: &'a T,
    topic: TopicName,
    subscription: String,
    position: u64,
    pending: VecDeque<Message>,
    failed: bool,
}

impl<'a, T: AdminTransport + ?Sized> PeekCursor<'a, T> {
    /// Start at the head of the backlog (position 1).
    pub fn new(transport: &'a T, topic: TopicName, subscription: impl Into<String>) -> Self {
        Self::starting_at(transport, topic, subscription, 1)
    }

    /// Resume at a given position. Positions start at 1.
    pub fn starting_at(
        transport: &'a T,
        topic: TopicName,
        subscription: impl Into<String>,
        position: u64,
    ) -> Self {
        Self {
            transport,
            topic,
            subscription: subscription.into(),
            position: position.max(1),
            pending: VecDeque::new(),
            failed: false,
        }
    }

    /// Position the next request will ask for.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    pub fn subscription(&self) -> &str {
        &self.subscription
    }

    /// Fetch the entry at the current position and advance.
    ///
    /// The position is not advanced when the request fails, so the same
    /// entry is retried on the next call.
    pub fn next_entry(&mut self) -> Result<PeekedEntry> {
        let entry = peek_nth_message(
            self.transport,
            &self.topic,
            &self.subscription,
            self.position,
        )?;
        self.position += 1;
        Ok(entry)
    }
}

impl<T: AdminTransport + ?Sized> Iterator for PeekCursor<'_, T> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Some(Ok(message));
            }
            if self.failed {
                return None;
            }
            match self.next_entry() {
                Ok(entry) => self.pending.extend(entry.into_messages()),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Peek at least `count` messages from the head of the backlog.
///
/// Positions 1, 2, ... are requested in order until `count` messages have
/// been collected. Entries are kept whole, so a trailing batch can push the
/// result past `count`. Any failure discards everything collected so far.
pub fn peek_messages<T>(
    transport: &T,
    topic: &TopicName,
    subscription: &str,
    count: usize,
) -> Result<Vec<Message>>
where
    T: AdminTransport + ?Sized,
{
    tracing::debug!(
        "Peeking {} message(s) from {} subscription {}",
        count,
        topic,
        subscription
    );

    let mut cursor = PeekCursor::new(transport, topic.clone(), subscription);
    let mut messages = Vec::with_capacity(count);
    let mut remaining = count;

    while remaining > 0 {
        let entry = cursor.next_entry()?;
        remaining = remaining.saturating_sub(entry.len());
        messages.extend(entry.into_messages());
    }

    tracing::debug!(
        "Peeked {} message(s) over {} position(s)",
        messages.len(),
        cursor.position() - 1
    );
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BatchBuilder;
    use crate::message::{MessageId, Properties};
    use crate::transport::{MockResponse, MockTransport};
    use reqwest::StatusCode;

    fn topic() -> TopicName {
        TopicName::parse("persistent://acme/orders/created").unwrap()
    }

    fn single(entry: i64) -> MockResponse {
        MockResponse::single_message(
            MessageId::new(7, entry),
            format!("msg-{}", entry).as_bytes(),
            &Properties::new(),
        )
    }

    #[test]
    fn test_position_path() {
        assert_eq!(
            position_path(&topic(), "my-sub", 3),
            vec![
                "persistent",
                "acme",
                "orders",
                "created",
                "subscription",
                "my-sub",
                "position",
                "3"
            ]
        );
    }

    #[test]
    fn test_cursor_iterates_lazily() {
        let mock = MockTransport::new();
        mock.push(single(0));
        mock.push(single(1));
        mock.push(single(2));

        let mut cursor = PeekCursor::new(&mock, topic(), "sub");
        let first = cursor.next().unwrap().unwrap();
        assert_eq!(first.payload, b"msg-0");
        assert_eq!(mock.requests().len(), 1);
        assert_eq!(cursor.position(), 2);

        let second = cursor.next().unwrap().unwrap();
        assert_eq!(second.message_id, MessageId::new(7, 1));
        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    fn test_cursor_flattens_batches() {
        let mock = MockTransport::new();
        mock.push(MockResponse::batch(
            MessageId::new(1, 1),
            BatchBuilder::new()
                .add(b"a", [("k", "1")])
                .add(b"b", [("k", "2")]),
        ));
        mock.push(single(9));

        let messages: Vec<Message> = PeekCursor::new(&mock, topic(), "sub")
            .take(3)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].message_id.batch_index, 0);
        assert_eq!(messages[1].message_id.batch_index, 1);
        assert_eq!(messages[2].payload, b"msg-9");
        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    fn test_cursor_stops_after_error() {
        let mock = MockTransport::new();
        mock.push(single(0));

        let mut cursor = PeekCursor::new(&mock, topic(), "sub");
        assert!(cursor.next().unwrap().is_ok());
        let err = cursor.next().unwrap().unwrap_err();
        assert!(err.is_not_found());
        assert!(cursor.next().is_none());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_cursor_resumes_at_position() {
        let mock = MockTransport::new();
        mock.push(single(4));

        let mut cursor = PeekCursor::starting_at(&mock, topic(), "sub", 5);
        cursor.next_entry().unwrap();
        assert_eq!(mock.requests()[0].path.last().unwrap(), "5");
        assert_eq!(cursor.position(), 6);

        let cursor = PeekCursor::starting_at(&mock, topic(), "sub", 0);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_peek_zero_issues_no_requests() {
        let mock = MockTransport::new();
        let messages = peek_messages(&mock, &topic(), "sub", 0).unwrap();
        assert!(messages.is_empty());
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_peek_keeps_whole_trailing_batch() {
        let mock = MockTransport::new();
        mock.push(single(0));
        mock.push(MockResponse::batch(
            MessageId::new(1, 1),
            BatchBuilder::new()
                .add(b"a", Properties::new())
                .add(b"b", Properties::new())
                .add(b"c", Properties::new()),
        ));

        let messages = peek_messages(&mock, &topic(), "sub", 2).unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    fn test_peek_failure_discards_partial_result() {
        let mock = MockTransport::new();
        mock.push(single(0));
        mock.push(
            MockResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
                .body(r#"{"reason":"ledger unavailable"}"#),
        );
        mock.push(single(2));

        let err = peek_messages(&mock, &topic(), "sub", 3).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(mock.requests().len(), 2);
        assert_eq!(mock.pending(), 1);
    }
}
