// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codec for peeked entries.
//!
//! - [`metadata`] decodes one length-prefixed record
//! - [`batch`] splits a batched entry into messages

pub mod batch;
pub mod metadata;

pub use batch::{unpack_batch, BatchBuilder};
pub use metadata::{
    decode_single_message, encode_single_message, BatchRecord, KeyValue, RecordReader,
    SingleMessageMetadata, META_SIZE_LEN,
};
