use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;
use tower::BoxError;

/// A processing fault shared between the failed-event context, the outcome
/// and the propagated error. Cloning keeps the same allocation.
pub type FaultCause = Arc<dyn StdError + Send + Sync + 'static>;

pub fn fault(err: BoxError) -> FaultCause {
    Arc::from(err)
}

/// Raised when a fault could not be turned into an outcome by the
/// authentication-failed event.
#[derive(Debug, Clone, Error)]
#[error("Could not handle authentication.")]
pub struct AuthenticationError {
    #[source]
    cause: FaultCause,
}

impl AuthenticationError {
    pub fn new(cause: FaultCause) -> Self {
        Self { cause }
    }

    pub fn cause(&self) -> &FaultCause {
        &self.cause
    }
}

/// Trigger of the authentication-failed event when the validator rejected the
/// certificate.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CertificateRejected {
    pub message: String,
}
