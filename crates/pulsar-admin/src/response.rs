// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interpretation of "peek Nth message" responses.
//!
//! The broker describes the peeked entry in response headers:
//!
//! | Header                        | Meaning                                    |
//! |-------------------------------|--------------------------------------------|
//! | `X-Pulsar-Message-ID`         | entry coordinate (required)                |
//! | `X-Pulsar-Publish-Time`       | copied to the `publish-time` property      |
//! | `X-Pulsar-Num-Batch-Message`  | body is a batch of that many records       |
//! | `X-Pulsar-PROPERTY-<name>`    | message property `<name>`                  |
//!
//! Header names are case-insensitive on the wire, so property names arrive
//! lower-cased.

use crate::codec::unpack_batch;
use crate::error::{AdminError, Result};
use crate::message::{Message, MessageId, Properties};
use crate::transport::RawResponse;
use reqwest::header::HeaderMap;
use std::io::Read;

pub const MESSAGE_ID_HEADER: &str = "X-Pulsar-Message-ID";
pub const PUBLISH_TIME_HEADER: &str = "X-Pulsar-Publish-Time";
pub const BATCH_HEADER: &str = "X-Pulsar-Num-Batch-Message";
pub const PROPERTY_PREFIX: &str = "X-Pulsar-PROPERTY-";

/// Property key receiving the publish time header.
pub const PUBLISH_TIME_PROPERTY: &str = "publish-time";

/// How the entry body is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLayout {
    /// The body is the payload of one message.
    Single,
    /// The body holds `batch_size` length-prefixed records.
    Batched { batch_size: usize },
}

/// Result of one classification pass over the response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderClassification {
    pub message_id: MessageId,
    /// Header-derived properties shared by every message of the entry.
    pub properties: Properties,
    pub layout: EntryLayout,
}

/// A decoded peek response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeekedEntry {
    SingleMessage(Message),
    BatchedMessages(Vec<Message>),
}

impl PeekedEntry {
    pub fn len(&self) -> usize {
        match self {
            Self::SingleMessage(_) => 1,
            Self::BatchedMessages(messages) => messages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_batched(&self) -> bool {
        matches!(self, Self::BatchedMessages(_))
    }

    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Self::SingleMessage(message) => vec![message],
            Self::BatchedMessages(messages) => messages,
        }
    }
}

/// Last value of a header, as text.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(name)
        .iter()
        .last()
        .and_then(|v| v.to_str().ok())
}

/// Classify the response headers.
///
/// Custom properties are collected first; the publish time and batch size
/// entries are applied afterwards and take precedence over a custom property
/// of the same name. Fails with [`AdminError::InvalidMessageId`] when the
/// message ID header is missing or unparsable, and with
/// [`AdminError::InvalidBatchSize`] when the batch header is present,
/// non-empty and not a non-negative integer.
pub fn classify_headers(headers: &HeaderMap) -> Result<HeaderClassification> {
    let raw_id = header_str(headers, MESSAGE_ID_HEADER).ok_or_else(|| {
        AdminError::InvalidMessageId {
            value: String::new(),
            reason: format!("missing {} header", MESSAGE_ID_HEADER),
        }
    })?;
    let message_id = MessageId::parse(raw_id)?;

    let prefix = PROPERTY_PREFIX.to_ascii_lowercase();
    let mut properties = Properties::new();

    // Values of a repeated header are yielded in order, so the last one wins.
    for (name, value) in headers.iter() {
        let Some(key) = name.as_str().strip_prefix(prefix.as_str()) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        match value.to_str() {
            Ok(value) => {
                properties.insert(key.to_string(), value.to_string());
            }
            Err(_) => tracing::debug!("Skipping non-text property header {}", name),
        }
    }

    if let Some(publish_time) = header_str(headers, PUBLISH_TIME_HEADER).filter(|v| !v.is_empty())
    {
        properties.insert(PUBLISH_TIME_PROPERTY.to_string(), publish_time.to_string());
    }

    let layout = match header_str(headers, BATCH_HEADER).filter(|v| !v.is_empty()) {
        Some(value) => {
            let batch_size =
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| AdminError::InvalidBatchSize {
                        value: value.to_string(),
                    })?;
            properties.insert(BATCH_HEADER.to_string(), value.to_string());
            EntryLayout::Batched { batch_size }
        }
        None => EntryLayout::Single,
    };

    Ok(HeaderClassification {
        message_id,
        properties,
        layout,
    })
}

/// Decode one peek response.
///
/// The response is consumed: its body is read to the end and the connection
/// is released when it drops, on success and on every error path.
pub fn interpret_response(topic: &str, response: RawResponse) -> Result<PeekedEntry> {
    let RawResponse {
        headers, mut body, ..
    } = response;

    let classification = classify_headers(&headers)?;

    let mut payload = Vec::new();
    body.read_to_end(&mut payload)
        .map_err(AdminError::BodyRead)?;
    drop(body);

    decode_entry(topic, classification, payload)
}

/// Build messages from classified headers and the full body.
pub fn decode_entry(
    topic: &str,
    classification: HeaderClassification,
    payload: Vec<u8>,
) -> Result<PeekedEntry> {
    let HeaderClassification {
        message_id,
        properties,
        layout,
    } = classification;

    match layout {
        EntryLayout::Single => {
            tracing::debug!(
                "Peeked message {} ({} bytes) on {}",
                message_id,
                payload.len(),
                topic
            );
            Ok(PeekedEntry::SingleMessage(Message::new(
                topic, message_id, payload, properties,
            )))
        }
        EntryLayout::Batched { batch_size } => {
            tracing::debug!(
                "Peeked batch {} with {} messages ({} bytes) on {}",
                message_id,
                batch_size,
                payload.len(),
                topic
            );
            let messages = unpack_batch(topic, message_id, &payload, batch_size, &properties)?;
            Ok(PeekedEntry::BatchedMessages(messages))
        }
    }
}
