use std::collections::BTreeMap;

use serde::Serialize;

use warehub_core::WarehouseKey;

/// `GET /warehouse/data` body: classification key -> raw record text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WarehouseDataResponse(pub BTreeMap<String, String>);

impl From<BTreeMap<WarehouseKey, String>> for WarehouseDataResponse {
    fn from(entries: BTreeMap<WarehouseKey, String>) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.as_str().to_string(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_keys_render_as_wire_strings() {
        let mut entries = BTreeMap::new();
        entries.insert(WarehouseKey::Unknown, "x".to_string());
        entries.insert(WarehouseKey::Linz, "y".to_string());

        let body = WarehouseDataResponse::from(entries);
        let keys: Vec<&str> = body.0.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Linz", "Unbekannt"]);
    }
}
