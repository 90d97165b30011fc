//! Error types for the subscription broker

use thiserror::Error;

/// Subscribe errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscribeError {
    /// Subscriber already holds more channels than allowed; nothing changed
    #[error("maximum number of subscriptions reached: allowed connections: {max}")]
    MaxSubscriptionsReached { subscriber: String, max: usize },
}

pub type SubscribeResult<T> = Result<T, SubscribeError>;
