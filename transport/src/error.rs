//! Service-level errors. Grounded on `engine-core::error` and
//! `wire_protocol::error`'s structured-variant `thiserror` style.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Config(#[from] serde_json::Error),

    #[error("inbound queue is full; message dropped")]
    QueueFull,

    #[error("engine thread has stopped accepting input")]
    EngineStopped,

    #[error("symbol registry is full: at most {max} symbols may be registered")]
    SymbolRegistryFull { max: usize },
}
