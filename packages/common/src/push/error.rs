use thiserror::Error;

/// Errors raised while setting up or authenticating the push client.
///
/// Per-device delivery failures are not errors; they are reported as
/// [`DeliveryStatus`](super::DeliveryStatus) values.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to read APNs signing key: {0}")]
    KeyFile(#[from] std::io::Error),
    #[error("invalid APNs signing key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign APNs provider token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
