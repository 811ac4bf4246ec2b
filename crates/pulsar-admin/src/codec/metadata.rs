// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-record decoding of a batched entry.
//!
//! # Record Format
//!
//! ```text
//! +---------------------------------------------------------+
//! | meta_size (4, big-endian) | SingleMessageMetadata (var) |
//! | payload (payload_size bytes, from the metadata)          |
//! +---------------------------------------------------------+
//! ```
//!
//! `SingleMessageMetadata` is the broker's protobuf (proto2) message.

use crate::error::{AdminError, Result};
use crate::message::Properties;
use byteorder::{BigEndian, ByteOrder};
use prost::Message as ProstMessage;

/// Size of the big-endian metadata length prefix.
pub const META_SIZE_LEN: usize = 4;

/// Key/value pair carried in message metadata.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyValue {
    #[prost(string, required, tag = "1")]
    pub key: String,
    #[prost(string, required, tag = "2")]
    pub value: String,
}

/// Metadata of one sub-message inside a batch.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SingleMessageMetadata {
    #[prost(message, repeated, tag = "1")]
    pub properties: Vec<KeyValue>,
    #[prost(string, optional, tag = "2")]
    pub partition_key: Option<String>,
    #[prost(int32, required, tag = "3")]
    pub payload_size: i32,
    #[prost(bool, optional, tag = "4")]
    pub compacted_out: Option<bool>,
    #[prost(uint64, optional, tag = "5")]
    pub event_time: Option<u64>,
    #[prost(bool, optional, tag = "6")]
    pub partition_key_b64_encoded: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub ordering_key: Option<Vec<u8>>,
    #[prost(uint64, optional, tag = "8")]
    pub sequence_id: Option<u64>,
    #[prost(bool, optional, tag = "9")]
    pub null_value: Option<bool>,
    #[prost(bool, optional, tag = "10")]
    pub null_partition_key: Option<bool>,
}

impl SingleMessageMetadata {
    /// Declared properties as a map. Later duplicates win.
    pub fn properties_map(&self) -> Properties {
        self.properties
            .iter()
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect()
    }
}

/// One decoded record, borrowing its payload from the batch buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord<'a> {
    pub metadata: SingleMessageMetadata,
    pub payload: &'a [u8],
}

/// Sequential reader over the records of a batch payload.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    /// Current byte offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(AdminError::TruncatedStream {
                offset: self.offset,
                needed,
                remaining,
            });
        }
        let start = self.offset;
        self.offset += needed;
        Ok(&self.buf[start..self.offset])
    }

    /// Decode the record at the current offset and advance past it.
    pub fn next_record(&mut self) -> Result<BatchRecord<'a>> {
        let meta_size = BigEndian::read_u32(self.take(META_SIZE_LEN)?) as usize;

        let meta_offset = self.offset;
        let meta_bytes = self.take(meta_size)?;
        let metadata = SingleMessageMetadata::decode(meta_bytes).map_err(|e| {
            AdminError::MalformedMetadata {
                offset: meta_offset,
                reason: e.to_string(),
            }
        })?;

        let payload_size = usize::try_from(metadata.payload_size).map_err(|_| {
            AdminError::MalformedMetadata {
                offset: meta_offset,
                reason: format!("negative payload size {}", metadata.payload_size),
            }
        })?;
        let payload = self.take(payload_size)?;

        Ok(BatchRecord { metadata, payload })
    }
}

/// Decode one record starting at `offset`.
///
/// Returns the metadata, the payload slice and the offset just past the record.
pub fn decode_single_message(
    buf: &[u8],
    offset: usize,
) -> Result<(SingleMessageMetadata, &[u8], usize)> {
    let mut reader = RecordReader::at(buf, offset);
    let record = reader.next_record()?;
    Ok((record.metadata, record.payload, reader.offset()))
}

/// Append one record to `buf`, filling in `payload_size` from `payload`.
pub fn encode_single_message(
    buf: &mut Vec<u8>,
    metadata: &SingleMessageMetadata,
    payload: &[u8],
) {
    let metadata = SingleMessageMetadata {
        payload_size: payload.len() as i32,
        ..metadata.clone()
    };
    let meta_bytes = metadata.encode_to_vec();

    let mut prefix = [0u8; META_SIZE_LEN];
    BigEndian::write_u32(&mut prefix, meta_bytes.len() as u32);

    buf.extend_from_slice(&prefix);
    buf.extend_from_slice(&meta_bytes);
    buf.extend_from_slice(payload);
}
