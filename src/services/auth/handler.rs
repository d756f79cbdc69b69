//! Client-certificate authentication handler.
//!
//! One call to [`CertificateAuthenticationHandler::authenticate`] drives one
//! attempt through: transport check → certificate extraction → validation →
//! identity mapping → events → outcome. The handler keeps no per-attempt
//! state of its own and can be shared across requests.

use std::sync::Arc;

use axum::http::request::Parts;
use tracing::{debug, error, warn};

use crate::services::auth::certificate::ClientCertificate;
use crate::services::auth::context::{AuthenticationFailedContext, CertificateValidatedContext};
use crate::services::auth::error::{AuthenticationError, CertificateRejected, FaultCause, fault};
use crate::services::auth::events::CertificateAuthenticationEvents;
use crate::services::auth::mapper::IdentityMapper;
use crate::services::auth::outcome::AuthenticateResult;
use crate::services::auth::transport::CertificateTransport;
use crate::services::auth::validator::{CertificateValidator, ValidatorOptions};

pub const DEFAULT_SCHEME: &str = "Certificate";

const REJECTION_SEPARATOR: &str = "\n - ";

/// A named configuration of the certificate handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationScheme {
    pub name: String,
    pub display_name: Option<String>,
}

impl AuthenticationScheme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }
}

impl Default for AuthenticationScheme {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CertificateAuthenticationOptions {
    /// Issuer stamped on mapped claims. Falls back to the scheme name.
    pub claims_issuer: Option<String>,
    pub validator: ValidatorOptions,
}

pub struct CertificateAuthenticationHandler {
    scheme: AuthenticationScheme,
    options: Arc<CertificateAuthenticationOptions>,
    transport: Arc<dyn CertificateTransport>,
    validator: Arc<dyn CertificateValidator>,
    mapper: Arc<dyn IdentityMapper>,
    events: Arc<dyn CertificateAuthenticationEvents>,
}

impl std::fmt::Debug for CertificateAuthenticationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthenticationHandler")
            .field("scheme", &self.scheme)
            .field("options", &self.options)
            .finish()
    }
}

impl CertificateAuthenticationHandler {
    pub fn new(
        scheme: AuthenticationScheme,
        options: Arc<CertificateAuthenticationOptions>,
        transport: Arc<dyn CertificateTransport>,
        validator: Arc<dyn CertificateValidator>,
        mapper: Arc<dyn IdentityMapper>,
        events: Arc<dyn CertificateAuthenticationEvents>,
    ) -> Self {
        Self {
            scheme,
            options,
            transport,
            validator,
            mapper,
            events,
        }
    }

    pub fn scheme(&self) -> &AuthenticationScheme {
        &self.scheme
    }

    pub fn options(&self) -> &Arc<CertificateAuthenticationOptions> {
        &self.options
    }

    /// Authenticate one request.
    ///
    /// Returns exactly one outcome, or `Err` when a processing fault was not
    /// absorbed by the authentication-failed event. Rejections are never
    /// returned as `Err`.
    pub async fn authenticate(
        &self,
        request: &Parts,
    ) -> Result<AuthenticateResult, AuthenticationError> {
        let scheme = self.scheme.name.as_str();

        if !self.transport.is_secure(request) {
            debug!(
                scheme,
                "request is not https; client certificates are only available over https"
            );
            return Ok(AuthenticateResult::NoResult);
        }

        let certificate = match self.transport.client_certificate(request).await {
            Ok(Some(certificate)) => certificate,
            Ok(None) => {
                debug!(scheme, "request does not contain a client certificate");
                return Ok(AuthenticateResult::NoResult);
            }
            Err(err) => return self.handle_fault(request, fault(err)).await,
        };

        let validation = match self
            .validator
            .validate(&certificate, &self.options.validator)
            .await
        {
            Ok(validation) => validation,
            Err(err) => return self.handle_fault(request, fault(err)).await,
        };

        if !validation.valid {
            let message = rejection_message(&certificate, &validation.errors);
            warn!(scheme, subject = %certificate.subject, "{message}");
            return Ok(self.handle_rejection(request, message).await);
        }

        self.handle_validated(request, &certificate).await
    }

    async fn handle_validated(
        &self,
        request: &Parts,
        certificate: &ClientCertificate,
    ) -> Result<AuthenticateResult, AuthenticationError> {
        let identity = match self
            .mapper
            .map(
                &self.scheme.name,
                certificate,
                self.options.claims_issuer.as_deref(),
            )
            .await
        {
            Ok(identity) => identity,
            Err(err) => return self.handle_fault(request, fault(err)).await,
        };

        let mut context = CertificateValidatedContext::new(
            request,
            &self.scheme,
            &self.options,
            certificate,
            identity,
        );
        self.events.certificate_validated(&mut context).await;

        Ok(context.into_result())
    }

    async fn handle_rejection(&self, request: &Parts, message: String) -> AuthenticateResult {
        let rejected: FaultCause = Arc::new(CertificateRejected {
            message: message.clone(),
        });
        let mut context =
            AuthenticationFailedContext::new(request, &self.scheme, &self.options, rejected);
        self.events.authentication_failed(&mut context).await;

        context
            .into_result()
            .unwrap_or_else(|| AuthenticateResult::fail(message))
    }

    async fn handle_fault(
        &self,
        request: &Parts,
        cause: FaultCause,
    ) -> Result<AuthenticateResult, AuthenticationError> {
        let err = AuthenticationError::new(cause.clone());
        error!(scheme = %self.scheme.name, error = %cause, "{err}");

        let mut context =
            AuthenticationFailedContext::new(request, &self.scheme, &self.options, cause);
        self.events.authentication_failed(&mut context).await;

        context.into_result().ok_or(err)
    }
}

/// `Client-certificate "<subject>" failed validation. Exceptions:` followed by
/// one ` - <error>` line per validator error.
pub fn rejection_message(certificate: &ClientCertificate, errors: &[String]) -> String {
    let mut message = format!(
        "Client-certificate \"{}\" failed validation. Exceptions:",
        certificate.subject
    );
    for error in errors {
        message.push_str(REJECTION_SEPARATOR);
        message.push_str(error);
    }
    message
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::Request;
    use tower::BoxError;
    use tracing_test::traced_test;

    use super::*;
    use crate::services::auth::events::DefaultCertificateEvents;
    use crate::services::auth::mapper::CertificateIdentityMapper;
    use crate::services::auth::validator::ValidationResult;

    struct StaticTransport {
        secure: bool,
        certificate: Option<ClientCertificate>,
    }

    #[async_trait]
    impl CertificateTransport for StaticTransport {
        fn is_secure(&self, _request: &Parts) -> bool {
            self.secure
        }

        async fn client_certificate(
            &self,
            _request: &Parts,
        ) -> Result<Option<ClientCertificate>, BoxError> {
            Ok(self.certificate.clone())
        }
    }

    struct StaticValidator(Result<ValidationResult, &'static str>);

    #[async_trait]
    impl CertificateValidator for StaticValidator {
        async fn validate(
            &self,
            _certificate: &ClientCertificate,
            _options: &ValidatorOptions,
        ) -> Result<ValidationResult, BoxError> {
            self.0.clone().map_err(Into::into)
        }
    }

    fn handler(
        secure: bool,
        validation: Result<ValidationResult, &'static str>,
    ) -> CertificateAuthenticationHandler {
        let certificate = ClientCertificate {
            subject: "CN=Example".to_string(),
            issuer: "CN=Example CA".to_string(),
            ..Default::default()
        };
        CertificateAuthenticationHandler::new(
            AuthenticationScheme::default(),
            Arc::default(),
            Arc::new(StaticTransport {
                secure,
                certificate: Some(certificate),
            }),
            Arc::new(StaticValidator(validation)),
            Arc::new(CertificateIdentityMapper),
            Arc::new(DefaultCertificateEvents),
        )
    }

    fn request() -> Parts {
        Request::new(()).into_parts().0
    }

    #[test]
    fn rejection_message_lists_errors() {
        let certificate = ClientCertificate {
            subject: "CN=Example".to_string(),
            ..Default::default()
        };
        let errors = vec!["First".to_string(), "Second".to_string()];
        assert_eq!(
            rejection_message(&certificate, &errors),
            "Client-certificate \"CN=Example\" failed validation. Exceptions:\n - First\n - Second"
        );
        assert_eq!(
            rejection_message(&certificate, &[]),
            "Client-certificate \"CN=Example\" failed validation. Exceptions:"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn insecure_channel_is_logged_at_debug() {
        let result = handler(false, Ok(ValidationResult::valid()))
            .authenticate(&request())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(logs_contain("request is not https"));
        assert!(!logs_contain("does not contain a client certificate"));
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_certificate_is_logged_at_debug() {
        let handler = CertificateAuthenticationHandler::new(
            AuthenticationScheme::default(),
            Arc::default(),
            Arc::new(StaticTransport {
                secure: true,
                certificate: None,
            }),
            Arc::new(StaticValidator(Ok(ValidationResult::valid()))),
            Arc::new(CertificateIdentityMapper),
            Arc::new(DefaultCertificateEvents),
        );
        let result = handler.authenticate(&request()).await.unwrap();
        assert!(result.is_none());
        assert!(logs_contain("request does not contain a client certificate"));
        assert!(!logs_contain("request is not https"));
    }

    #[tokio::test]
    #[traced_test]
    async fn rejection_is_logged_as_warning() {
        let result = handler(true, Ok(ValidationResult::invalid(["First", "Second"])))
            .authenticate(&request())
            .await
            .unwrap();
        assert!(result.failure_message().unwrap().contains(" - Second"));
        assert!(logs_contain("WARN"));
        assert!(logs_contain("failed validation"));
    }

    #[tokio::test]
    #[traced_test]
    async fn fault_is_logged_as_error() {
        let err = handler(true, Err("revocation endpoint unreachable"))
            .authenticate(&request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not handle authentication.");
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("revocation endpoint unreachable"));
    }
}
