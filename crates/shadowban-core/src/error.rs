use thiserror::Error;

/// Failure to retrieve a status page. Always recoverable: it ends up in the
/// account's result slot, never in the caller's control flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out contacting the site")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Transport(String),
}

/// Failure to deliver a message to a tenant.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// The persistence layer could not complete an operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid handle: {0:?}")]
    InvalidHandle(String),
}
