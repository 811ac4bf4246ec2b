// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pulsar Admin Client
//!
//! Blocking client for the Apache Pulsar broker admin REST API, focused on
//! subscription management and backlog inspection.
//!
//! # Features
//!
//! - **Subscriptions**: create, delete, list, reset cursor, skip, expire
//! - **Peek**: read messages from a backlog without consuming them
//! - **Batch Decoding**: split batched entries into their sub-messages
//! - **Pluggable Transport**: `reqwest` over HTTP, or a mock for tests
//!
//! # Quick Start
//!
//! ```no_run
//! use pulsar_admin::{ClientConfig, PulsarAdmin, TopicName};
//!
//! # fn main() -> pulsar_admin::Result<()> {
//! let config = ClientConfig::builder()
//!     .web_service_url("http://localhost:8080")
//!     .build()?;
//! let admin = PulsarAdmin::new(&config)?;
//!
//! let topic = TopicName::parse("persistent://public/default/orders")?;
//! for message in admin.subscriptions().peek_messages(&topic, "audit", 10)? {
//!     println!("{} {} bytes", message.message_id, message.payload.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! web_service_url = "http://broker.internal:8080"
//! admin_path = "/admin/v2"
//! request_timeout_secs = 30
//! connect_timeout_secs = 10
//! ```

pub mod admin;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod peek;
pub mod response;
pub mod topic;
pub mod transport;

pub use admin::{PulsarAdmin, Subscriptions};
pub use codec::{unpack_batch, BatchBuilder, SingleMessageMetadata};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use error::{AdminError, Result, TransportError};
pub use message::{Message, MessageId, Properties};
pub use peek::{peek_messages, peek_nth_message, PeekCursor};
pub use response::{classify_headers, interpret_response, EntryLayout, PeekedEntry};
pub use topic::{TopicDomain, TopicName};
pub use transport::{AdminRequest, AdminTransport, HttpTransport, MockResponse, MockTransport};
