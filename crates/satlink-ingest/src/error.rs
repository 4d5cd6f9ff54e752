/// Errors that can occur in ingestion operations.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Transport-level error, including bind failure at start.
    #[error("transport error: {0}")]
    Transport(#[from] satlink_transport::TransportError),

    /// The listener thread could not be spawned.
    #[error("failed to spawn listener thread: {0}")]
    Spawn(std::io::Error),

    /// The persistence collaborator rejected an operation.
    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
