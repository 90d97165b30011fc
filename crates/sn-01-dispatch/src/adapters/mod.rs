//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits: the Matrix push gateway over HTTP and
//! the TTL message store over Redis or memory.

mod gateway;
mod memory_store;
mod redis_store;

pub use gateway::{HttpGatewayClient, MockGatewayClient, PushCall, NOTIFY_PATH};
pub use memory_store::{InMemoryMessageStore, MockMessageStore};
pub use redis_store::{escape_glob, RedisMessageStore};
