// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Admin client entry point.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::message::{Message, MessageId};
use crate::peek::{self, PeekCursor};
use crate::response::PeekedEntry;
use crate::topic::TopicName;
use crate::transport::{send_json, send_unit, AdminRequest, AdminTransport, HttpTransport};

/// Pulsar admin client.
///
/// Generic over the transport so tests can swap in
/// [`MockTransport`](crate::transport::MockTransport).
#[derive(Debug, Clone)]
pub struct PulsarAdmin<T: AdminTransport = HttpTransport> {
    transport: T,
}

impl PulsarAdmin<HttpTransport> {
    /// Client talking HTTP to the broker described by `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }
}

impl<T: AdminTransport> PulsarAdmin<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Subscription operations.
    pub fn subscriptions(&self) -> Subscriptions<'_, T> {
        Subscriptions {
            transport: &self.transport,
        }
    }
}

/// Subscription management on persistent topics.
#[derive(Debug)]
pub struct Subscriptions<'a, T: AdminTransport> {
    transport: &'a T,
}

fn subscription_path(topic: &TopicName, subscription: &str, tail: &[&str]) -> Vec<String> {
    let mut path = topic.rest_path();
    path.push("subscription".to_string());
    path.push(subscription.to_string());
    path.extend(tail.iter().map(|s| s.to_string()));
    path
}

impl<'a, T: AdminTransport> Subscriptions<'a, T> {
    /// Create a subscription whose cursor starts at `position`.
    pub fn create(
        &self,
        topic: &TopicName,
        subscription: &str,
        position: MessageId,
    ) -> Result<()> {
        tracing::debug!(
            "Creating subscription {} on {} at {}",
            subscription,
            topic,
            position
        );
        let request = AdminRequest::put(subscription_path(topic, subscription, &[]))
            .with_json(serde_json::to_value(position)?);
        send_unit(self.transport, request)
    }

    pub fn delete(&self, topic: &TopicName, subscription: &str) -> Result<()> {
        tracing::debug!("Deleting subscription {} on {}", subscription, topic);
        let request = AdminRequest::delete(subscription_path(topic, subscription, &[]));
        send_unit(self.transport, request)
    }

    /// Names of the topic's subscriptions.
    pub fn list(&self, topic: &TopicName) -> Result<Vec<String>> {
        let mut path = topic.rest_path();
        path.push("subscriptions".to_string());
        send_json(self.transport, AdminRequest::get(path))
    }

    pub fn reset_cursor_to_message_id(
        &self,
        topic: &TopicName,
        subscription: &str,
        position: MessageId,
    ) -> Result<()> {
        tracing::debug!("Resetting {} on {} to {}", subscription, topic, position);
        let request = AdminRequest::post(subscription_path(topic, subscription, &["resetcursor"]))
            .with_json(serde_json::to_value(position)?);
        send_unit(self.transport, request)
    }

    /// Reset to the first message published at or after `timestamp_ms`.
    pub fn reset_cursor_to_timestamp(
        &self,
        topic: &TopicName,
        subscription: &str,
        timestamp_ms: i64,
    ) -> Result<()> {
        tracing::debug!(
            "Resetting {} on {} to timestamp {}",
            subscription,
            topic,
            timestamp_ms
        );
        let timestamp = timestamp_ms.to_string();
        let request = AdminRequest::post(subscription_path(
            topic,
            subscription,
            &["resetcursor", &timestamp],
        ));
        send_unit(self.transport, request)
    }

    /// Skip every message in the backlog.
    pub fn clear_backlog(&self, topic: &TopicName, subscription: &str) -> Result<()> {
        let request = AdminRequest::post(subscription_path(topic, subscription, &["skip_all"]));
        send_unit(self.transport, request)
    }

    pub fn skip_messages(&self, topic: &TopicName, subscription: &str, count: u64) -> Result<()> {
        let count = count.to_string();
        let request =
            AdminRequest::post(subscription_path(topic, subscription, &["skip", &count]));
        send_unit(self.transport, request)
    }

    /// Expire messages older than `expire_secs`.
    pub fn expire_messages(
        &self,
        topic: &TopicName,
        subscription: &str,
        expire_secs: u64,
    ) -> Result<()> {
        let secs = expire_secs.to_string();
        let request = AdminRequest::post(subscription_path(
            topic,
            subscription,
            &["expireMessages", &secs],
        ));
        send_unit(self.transport, request)
    }

    /// Expire messages older than `expire_secs` on every subscription.
    pub fn expire_all_messages(&self, topic: &TopicName, expire_secs: u64) -> Result<()> {
        let mut path = topic.rest_path();
        path.extend([
            "all_subscription".to_string(),
            "expireMessages".to_string(),
            expire_secs.to_string(),
        ]);
        send_unit(self.transport, AdminRequest::post(path))
    }

    /// Peek at least `count` messages from the head of the backlog.
    pub fn peek_messages(
        &self,
        topic: &TopicName,
        subscription: &str,
        count: usize,
    ) -> Result<Vec<Message>> {
        peek::peek_messages(self.transport, topic, subscription, count)
    }

    /// Lazy cursor over the backlog, starting at position 1.
    pub fn peek(&self, topic: &TopicName, subscription: &str) -> PeekCursor<'a, T> {
        PeekCursor::new(self.transport, topic.clone(), subscription)
    }

    pub fn peek_nth_message(
        &self,
        topic: &TopicName,
        subscription: &str,
        position: u64,
    ) -> Result<PeekedEntry> {
        peek::peek_nth_message(self.transport, topic, subscription, position)
    }
}
