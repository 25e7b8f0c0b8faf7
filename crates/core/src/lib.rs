//! `warehub-core` — warehouse domain primitives.
//!
//! Pure types only (no IO): classification keys, the synthetic inventory
//! record, consumer-group identities and the domain error model.

pub mod error;
pub mod id;
pub mod warehouse;

pub use error::{DomainError, DomainResult};
pub use id::GroupId;
pub use warehouse::{ACKNOWLEDGMENT, InventoryRecord, WarehouseKey};
