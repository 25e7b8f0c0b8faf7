//! Warehouse classification and the synthetic inventory record.
//!
//! Records travel as opaque text. The central aggregator never parses them; it
//! only scans the raw payload for known warehouse names to pick a bucket.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Fixed acknowledgment text published after a record has been stored.
pub const ACKNOWLEDGMENT: &str = "SUCCESS: Verarbeitet.";

/// Classification key of an inventory record.
///
/// The set is closed: every key the store can ever hold is one of these.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarehouseKey {
    Linz,
    Wien,
    #[serde(rename = "Unbekannt")]
    Unknown,
}

impl WarehouseKey {
    /// All keys, in classification priority order (fallback last).
    pub const ALL: [WarehouseKey; 3] = [WarehouseKey::Linz, WarehouseKey::Wien, WarehouseKey::Unknown];

    /// Classify a raw payload. First match wins: Linz, then Wien, else Unknown.
    pub fn classify(payload: &str) -> Self {
        Self::ALL
            .into_iter()
            .filter(|k| *k != WarehouseKey::Unknown)
            .find(|k| payload.contains(k.as_str()))
            .unwrap_or(WarehouseKey::Unknown)
    }

    /// Key as exposed on the wire and over HTTP.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseKey::Linz => "Linz",
            WarehouseKey::Wien => "Wien",
            WarehouseKey::Unknown => "Unbekannt",
        }
    }
}

impl core::fmt::Display for WarehouseKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the exact wire key; like [`WarehouseKey::classify`], case matters.
impl FromStr for WarehouseKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::UnknownKey(s.to_string()))
    }
}

/// Synthetic inventory record emitted by a warehouse node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: String,
    pub item: String,
    pub count: i64,
}

impl InventoryRecord {
    /// Record for the warehouse named `warehouse` (id `Warehouse_<name>`).
    pub fn for_warehouse(warehouse: &str, item: impl Into<String>, count: i64) -> DomainResult<Self> {
        let warehouse = warehouse.trim();
        if warehouse.is_empty() {
            return Err(DomainError::validation("warehouse name must not be empty"));
        }
        Ok(Self {
            id: format!("Warehouse_{warehouse}"),
            item: item.into(),
            count,
        })
    }

    /// Render the JSON text that goes on the wire.
    pub fn to_payload(&self) -> DomainResult<String> {
        serde_json::to_string(self).map_err(|e| DomainError::validation(e.to_string()))
    }
}
