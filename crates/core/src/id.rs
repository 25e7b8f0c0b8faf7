//! Consumer-group identities.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identity that decides how subscribers share a topic.
///
/// Subscribers using the same `GroupId` split delivery between them; subscribers
/// in distinct groups each receive a full copy of the stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// A fixed, shared identity (load-split between everyone using it).
    pub fn fixed(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// A fresh identity of the form `<prefix>-<uuid>`.
    ///
    /// Generate this once per process start: no other instance will ever share
    /// the group, so this instance always sees every record (fan-out).
    pub fn random(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for GroupId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GroupId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("GroupId: empty"));
        }
        Ok(Self(trimmed.to_string()))
    }
}
