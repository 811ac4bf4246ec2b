// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batched entries.
//!
//! A batched entry is `batch_size` records laid end to end (see
//! [`metadata`](super::metadata) for the record layout). Every sub-message
//! shares the entry's ledger/entry coordinate and gets its ordinal as
//! batch index.

use super::metadata::{encode_single_message, KeyValue, RecordReader, SingleMessageMetadata};
use super::META_SIZE_LEN;
use crate::error::Result;
use crate::message::{Message, MessageId, Properties};

/// Split a batched entry into its sub-messages.
///
/// Each message starts from a copy of `shared` (header-derived properties)
/// overlaid with its own declared properties; declared properties win on
/// conflicting keys and never leak into sibling messages.
///
/// All-or-nothing: the first record error is returned and no messages are.
pub fn unpack_batch(
    topic: &str,
    entry_id: MessageId,
    payload: &[u8],
    batch_size: usize,
    shared: &Properties,
) -> Result<Vec<Message>> {
    // Every record takes at least its length prefix, which bounds the allocation
    // when the header announces more records than the payload can hold.
    let mut messages = Vec::with_capacity(batch_size.min(payload.len() / META_SIZE_LEN));
    let mut reader = RecordReader::new(payload);

    for index in 0..batch_size {
        let record = reader.next_record()?;

        let mut properties = shared.clone();
        properties.extend(record.metadata.properties_map());

        tracing::trace!(
            "Batch {} record {}/{}: {} bytes payload, {} properties",
            entry_id,
            index + 1,
            batch_size,
            record.payload.len(),
            properties.len()
        );

        messages.push(Message::new(
            topic,
            entry_id.with_batch_index(index as u32),
            record.payload.to_vec(),
            properties,
        ));
    }

    if reader.remaining() > 0 {
        tracing::trace!(
            "Batch {}: ignoring {} trailing bytes after {} records",
            entry_id,
            reader.remaining(),
            batch_size
        );
    }

    Ok(messages)
}

/// Builds a batched entry payload.
///
/// The broker produces these; the builder exists so batches can be
/// fabricated for tests and mock transports.
#[derive(Debug, Default, Clone)]
pub struct BatchBuilder {
    buf: Vec<u8>,
    count: usize,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sub-message with the given declared properties.
    pub fn add<I, K, V>(mut self, payload: &[u8], properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let metadata = SingleMessageMetadata {
            properties: properties
                .into_iter()
                .map(|(k, v)| KeyValue {
                    key: k.into(),
                    value: v.into(),
                })
                .collect(),
            ..Default::default()
        };
        self.push(&metadata, payload);
        self
    }

    /// Append a sub-message with explicit metadata.
    pub fn push(&mut self, metadata: &SingleMessageMetadata, payload: &[u8]) {
        encode_single_message(&mut self.buf, metadata, payload);
        self.count += 1;
    }

    /// Number of sub-messages written so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdminError;

    const TOPIC: &str = "persistent://public/default/orders";

    fn no_props() -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    fn shared_props() -> Properties {
        Properties::from([
            ("publish-time".to_string(), "2024-05-01T10:00:00Z".to_string()),
            ("region".to_string(), "eu".to_string()),
        ])
    }

    #[test]
    fn test_unpack_assigns_batch_indexes() {
        let payload = BatchBuilder::new()
            .add(b"a", no_props())
            .add(b"bb", no_props())
            .add(b"ccc", no_props())
            .build();
        let entry = MessageId::new(42, 7);

        let messages = unpack_batch(TOPIC, entry, &payload, 3, &Properties::new()).unwrap();

        assert_eq!(messages.len(), 3);
        for (i, msg) in messages.iter().enumerate() {
            assert_eq!(msg.topic, TOPIC);
            assert_eq!(msg.message_id.ledger_id, 42);
            assert_eq!(msg.message_id.entry_id, 7);
            assert_eq!(msg.message_id.batch_index, i as u32);
        }
        assert_eq!(messages[0].payload, b"a");
        assert_eq!(messages[1].payload, b"bb");
        assert_eq!(messages[2].payload, b"ccc");
    }

    #[test]
    fn test_roundtrip_payloads_and_properties() {
        let subs: Vec<(Vec<u8>, Vec<(String, String)>)> = (0..5)
            .map(|i| {
                let payload = vec![i as u8; i * 3];
                let props = (0..i)
                    .map(|j| (format!("key-{}", j), format!("value-{}-{}", i, j)))
                    .collect();
                (payload, props)
            })
            .collect();

        let mut builder = BatchBuilder::new();
        for (payload, props) in &subs {
            builder = builder.add(payload, props.clone());
        }
        assert_eq!(builder.len(), 5);
        let payload = builder.build();

        let messages =
            unpack_batch(TOPIC, MessageId::new(1, 1), &payload, 5, &Properties::new()).unwrap();

        for (msg, (expected_payload, expected_props)) in messages.iter().zip(&subs) {
            assert_eq!(&msg.payload, expected_payload);
            let expected: Properties = expected_props.iter().cloned().collect();
            assert_eq!(msg.properties, expected);
        }
    }

    #[test]
    fn test_declared_properties_override_shared() {
        let payload = BatchBuilder::new()
            .add(b"x", [("region", "us"), ("trace", "abc")])
            .add(b"y", no_props())
            .build();

        let messages =
            unpack_batch(TOPIC, MessageId::new(1, 2), &payload, 2, &shared_props()).unwrap();

        assert_eq!(messages[0].property("region"), Some("us"));
        assert_eq!(messages[0].property("trace"), Some("abc"));
        assert_eq!(
            messages[0].property("publish-time"),
            Some("2024-05-01T10:00:00Z")
        );

        // Sibling keeps the shared value and does not see "trace".
        assert_eq!(messages[1].property("region"), Some("eu"));
        assert_eq!(messages[1].property("trace"), None);
    }

    #[test]
    fn test_zero_batch_size() {
        let messages =
            unpack_batch(TOPIC, MessageId::new(1, 2), &[], 0, &Properties::new()).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut payload = BatchBuilder::new().add(b"only", no_props()).build();
        payload.extend_from_slice(&[0xde, 0xad]);

        let messages =
            unpack_batch(TOPIC, MessageId::new(1, 2), &payload, 1, &Properties::new()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload, b"only");
    }

    #[test]
    fn test_fewer_records_than_declared_fails() {
        let payload = BatchBuilder::new()
            .add(b"one", no_props())
            .add(b"two", no_props())
            .build();

        let err =
            unpack_batch(TOPIC, MessageId::new(1, 2), &payload, 3, &Properties::new()).unwrap_err();
        assert!(matches!(
            err,
            AdminError::TruncatedStream {
                needed: 4,
                remaining: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_truncation_anywhere_fails() {
        let payload = BatchBuilder::new()
            .add(b"first", [("a", "1")])
            .add(b"second", [("b", "2")])
            .build();

        for cut in 0..payload.len() {
            let result = unpack_batch(
                TOPIC,
                MessageId::new(1, 2),
                &payload[..cut],
                2,
                &Properties::new(),
            );
            assert!(
                matches!(result, Err(AdminError::TruncatedStream { .. })),
                "cut at {} should fail with TruncatedStream, got {:?}",
                cut,
                result
            );
        }
    }

    #[test]
    fn test_inflated_length_field_fails() {
        let mut payload = BatchBuilder::new()
            .add(b"first", no_props())
            .add(b"second", no_props())
            .build();
        let declared = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        payload[..4].copy_from_slice(&(declared + 500).to_be_bytes());

        let err =
            unpack_batch(TOPIC, MessageId::new(1, 2), &payload, 2, &Properties::new()).unwrap_err();
        assert!(matches!(err, AdminError::TruncatedStream { .. }));
    }

    #[test]
    fn test_huge_declared_batch_size_does_not_preallocate() {
        let payload = BatchBuilder::new().add(b"a", no_props()).build();
        let result = unpack_batch(
            TOPIC,
            MessageId::new(1, 2),
            &payload,
            usize::MAX,
            &Properties::new(),
        );
        assert!(matches!(result, Err(AdminError::TruncatedStream { .. })));
    }
}
