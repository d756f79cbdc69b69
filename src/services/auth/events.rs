use async_trait::async_trait;

use crate::services::auth::context::{AuthenticationFailedContext, CertificateValidatedContext};

/// Extension points of the certificate handler.
///
/// Both hooks default to doing nothing, which keeps the handler's own
/// decision. A hook overrides it by setting a result on the context
/// (`success`, `fail`, `fail_with`, `no_result`, `handle`).
///
/// Implementations are configured once per scheme and shared across requests.
#[async_trait]
pub trait CertificateAuthenticationEvents: Send + Sync {
    /// Called after the certificate passed validation and was mapped to an identity.
    async fn certificate_validated(&self, _context: &mut CertificateValidatedContext<'_>) {}

    /// Called when the certificate was rejected or processing failed.
    async fn authentication_failed(&self, _context: &mut AuthenticationFailedContext<'_>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCertificateEvents;

impl CertificateAuthenticationEvents for DefaultCertificateEvents {}
