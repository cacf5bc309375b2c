use thiserror::Error;

/// Errors returned by the injected collaborators (session factory, storage client, encoders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every variant is terminal for the current request. Nothing is retried.
#[derive(Debug, Error)]
pub enum PingError {
    #[error("device id required")]
    MissingDeviceId,
    #[error("failed to create aws session: {0}")]
    SessionSetupFailed(BoxError),
    #[error("dynamodb encountered an error marshalling data: {0}")]
    StorageEncodingFailed(BoxError),
    #[error("failed to write the ping log: {0}")]
    WriteFailed(BoxError),
    #[error("encountered an error marshalling json data: {0}")]
    ResponseEncodingFailed(BoxError),
}
