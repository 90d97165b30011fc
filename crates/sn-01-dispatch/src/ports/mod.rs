//! Ports module for the dispatch subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::NotificationApi;
pub use outbound::{GatewayClient, MessageStore, NotificationEnvelope, PushContent};
