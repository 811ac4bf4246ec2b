// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic names.
//!
//! Accepted forms:
//!
//! ```text
//! persistent://tenant/namespace/topic
//! tenant/namespace/topic            -> persistent://tenant/namespace/topic
//! topic                             -> persistent://public/default/topic
//! ```

use crate::error::{AdminError, Result};
use std::fmt;
use std::str::FromStr;

const DEFAULT_TENANT: &str = "public";
const DEFAULT_NAMESPACE: &str = "default";

/// Topic persistence domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicDomain {
    Persistent,
    NonPersistent,
}

impl TopicDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::NonPersistent => "non-persistent",
        }
    }
}

/// A fully qualified topic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicName {
    domain: TopicDomain,
    tenant: String,
    namespace: String,
    local_name: String,
}

impl TopicName {
    /// Parse a topic name in any of the accepted forms.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = |reason: &str| AdminError::InvalidTopicName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let (domain, rest) = match name.split_once("://") {
            Some(("persistent", rest)) => (TopicDomain::Persistent, rest),
            Some(("non-persistent", rest)) => (TopicDomain::NonPersistent, rest),
            Some((other, _)) => {
                return Err(invalid(&format!(
                    "unknown domain {:?}, expected persistent or non-persistent",
                    other
                )))
            }
            None => (TopicDomain::Persistent, name),
        };

        let parts: Vec<&str> = rest.splitn(3, '/').collect();
        let (tenant, namespace, local_name) = match parts.as_slice() {
            [local] if !name.contains("://") => (DEFAULT_TENANT, DEFAULT_NAMESPACE, *local),
            [tenant, namespace, local] => (*tenant, *namespace, *local),
            _ => {
                return Err(invalid(
                    "expected <domain>://<tenant>/<namespace>/<topic> or a short topic name",
                ))
            }
        };

        if tenant.is_empty() || namespace.is_empty() || local_name.is_empty() {
            return Err(invalid("tenant, namespace and topic must be non-empty"));
        }

        Ok(Self {
            domain,
            tenant: tenant.to_string(),
            namespace: namespace.to_string(),
            local_name: local_name.to_string(),
        })
    }

    pub fn domain(&self) -> TopicDomain {
        self.domain
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Path segments addressing this topic under the admin API.
    ///
    /// Segments are not escaped here; the transport encodes each one.
    pub fn rest_path(&self) -> Vec<String> {
        vec![
            self.domain.as_str().to_string(),
            self.tenant.clone(),
            self.namespace.clone(),
            self.local_name.clone(),
        ]
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}/{}",
            self.domain.as_str(),
            self.tenant,
            self.namespace,
            self.local_name
        )
    }
}

impl FromStr for TopicName {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
