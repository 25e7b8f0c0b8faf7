//! Infrastructure-backed broker implementations.
//!
//! The broker contract lives in `warehub-events` as pure mechanics. This
//! module provides network-backed implementations (e.g. Redis).

#[cfg(feature = "redis")]
pub mod redis_streams;

#[cfg(feature = "redis")]
pub use redis_streams::{RedisBrokerError, RedisStreamsBroker};
