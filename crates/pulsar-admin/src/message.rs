// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message identity and peeked messages.

use crate::error::{AdminError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Message properties (key -> value).
pub type Properties = BTreeMap<String, String>;

/// Position of a message in a topic's log.
///
/// The ledger/entry coordinate addresses one stored entry; `batch_index`
/// selects a sub-message inside a batched entry and is 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    #[serde(rename = "ledgerId")]
    pub ledger_id: i64,

    #[serde(rename = "entryId")]
    pub entry_id: i64,

    /// Partition of a partitioned topic, -1 when not partitioned.
    #[serde(rename = "partitionIndex", default = "no_partition")]
    pub partition_index: i32,

    #[serde(skip)]
    pub batch_index: u32,
}

fn no_partition() -> i32 {
    -1
}

impl MessageId {
    /// Oldest available message.
    pub const EARLIEST: Self = Self {
        ledger_id: -1,
        entry_id: -1,
        partition_index: -1,
        batch_index: 0,
    };

    /// Next message to be published.
    pub const LATEST: Self = Self {
        ledger_id: i64::MAX,
        entry_id: i64::MAX,
        partition_index: -1,
        batch_index: 0,
    };

    pub fn new(ledger_id: i64, entry_id: i64) -> Self {
        Self {
            ledger_id,
            entry_id,
            partition_index: -1,
            batch_index: 0,
        }
    }

    /// Same coordinate, different sub-message.
    pub fn with_batch_index(self, batch_index: u32) -> Self {
        Self {
            batch_index,
            ..self
        }
    }

    /// Parse `ledger:entry[:partition[:batch]]`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: String| AdminError::InvalidMessageId {
            value: s.to_string(),
            reason,
        };

        let parts: Vec<&str> = s.trim().split(':').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(invalid(format!(
                "expected ledger:entry[:partition[:batch]], got {} field(s)",
                parts.len()
            )));
        }

        let ledger_id = parts[0]
            .parse::<i64>()
            .map_err(|e| invalid(format!("ledger id: {}", e)))?;
        let entry_id = parts[1]
            .parse::<i64>()
            .map_err(|e| invalid(format!("entry id: {}", e)))?;
        let partition_index = match parts.get(2) {
            Some(p) => p
                .parse::<i32>()
                .map_err(|e| invalid(format!("partition index: {}", e)))?,
            None => -1,
        };
        // Brokers write -1 for entries that are not batched.
        let batch_index = match parts.get(3) {
            Some(b) => b
                .parse::<i32>()
                .map_err(|e| invalid(format!("batch index: {}", e)))?
                .max(0) as u32,
            None => 0,
        };

        Ok(Self {
            ledger_id,
            entry_id,
            partition_index,
            batch_index,
        })
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ledger_id, self.entry_id)?;
        if self.batch_index > 0 {
            write!(f, ":{}:{}", self.partition_index, self.batch_index)
        } else if self.partition_index != -1 {
            write!(f, ":{}", self.partition_index)
        } else {
            Ok(())
        }
    }
}

impl FromStr for MessageId {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A message returned by a peek.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Fully qualified topic name.
    pub topic: String,

    pub message_id: MessageId,

    pub payload: Vec<u8>,

    pub properties: Properties,
}

impl Message {
    pub fn new(
        topic: impl Into<String>,
        message_id: MessageId,
        payload: Vec<u8>,
        properties: Properties,
    ) -> Self {
        Self {
            topic: topic.into(),
            message_id,
            payload,
            properties,
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_fields() {
        let id = MessageId::parse("123:45").unwrap();
        assert_eq!(id, MessageId::new(123, 45));
        assert_eq!(id.partition_index, -1);
        assert_eq!(id.batch_index, 0);
    }

    #[test]
    fn test_parse_four_fields() {
        let id: MessageId = "7:8:2:5".parse().unwrap();
        assert_eq!(id.ledger_id, 7);
        assert_eq!(id.entry_id, 8);
        assert_eq!(id.partition_index, 2);
        assert_eq!(id.batch_index, 5);
    }

    #[test]
    fn test_parse_negative_batch_index_is_zero() {
        let id = MessageId::parse("7:8:-1:-1").unwrap();
        assert_eq!(id.partition_index, -1);
        assert_eq!(id.batch_index, 0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "12", "a:b", "1:2:3:4:5", "1:x", "1:2:p", "1:2:3:b"] {
            assert!(
                matches!(
                    MessageId::parse(bad),
                    Err(AdminError::InvalidMessageId { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_display_parses_back() {
        for id in [
            MessageId::new(1, 2),
            MessageId {
                partition_index: 3,
                ..MessageId::new(1, 2)
            },
            MessageId::new(1, 2).with_batch_index(4),
            MessageId::EARLIEST,
        ] {
            assert_eq!(MessageId::parse(&id.to_string()).unwrap(), id);
        }
        assert_eq!(MessageId::new(10, 20).with_batch_index(3).to_string(), "10:20:-1:3");
    }

    #[test]
    fn test_json_shape() {
        let id = MessageId::new(11, 22).with_batch_index(9);
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ledgerId": 11, "entryId": 22, "partitionIndex": -1})
        );

        let parsed: MessageId = serde_json::from_str(r#"{"ledgerId":1,"entryId":2}"#).unwrap();
        assert_eq!(parsed, MessageId::new(1, 2));
    }

    #[test]
    fn test_with_batch_index_keeps_coordinate() {
        let shared = MessageId::new(5, 6);
        let sub = shared.with_batch_index(2);
        assert_eq!(sub.ledger_id, 5);
        assert_eq!(sub.entry_id, 6);
        assert_eq!(sub.batch_index, 2);
        assert_eq!(shared.batch_index, 0);
    }
}
