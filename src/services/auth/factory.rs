/// Factory: register a certificate scheme and build its handler.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::events::{CertificateAuthenticationEvents, DefaultCertificateEvents};
use crate::services::auth::handler::{
    AuthenticationScheme, CertificateAuthenticationHandler, CertificateAuthenticationOptions,
};
use crate::services::auth::mapper::{CertificateIdentityMapper, IdentityMapper};
use crate::services::auth::transport::{
    CertificateTransport, ForwardedCertificateTransport, TlsConnectionTransport,
};
use crate::services::auth::validator::{CertificateValidator, PolicyCertificateValidator};

/// Builder for one certificate authentication scheme.
///
/// Every collaborator has a default, so
/// `CertificateAuthenticationBuilder::new().build()` yields a working handler
/// for the `Certificate` scheme that reads certificates from `TlsConnectInfo`.
pub struct CertificateAuthenticationBuilder {
    scheme: AuthenticationScheme,
    options: CertificateAuthenticationOptions,
    transport: Arc<dyn CertificateTransport>,
    validator: Arc<dyn CertificateValidator>,
    mapper: Arc<dyn IdentityMapper>,
    events: Arc<dyn CertificateAuthenticationEvents>,
}

impl Default for CertificateAuthenticationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateAuthenticationBuilder {
    pub fn new() -> Self {
        Self {
            scheme: AuthenticationScheme::default(),
            options: CertificateAuthenticationOptions::default(),
            transport: Arc::new(TlsConnectionTransport),
            validator: Arc::new(PolicyCertificateValidator),
            mapper: Arc::new(CertificateIdentityMapper),
            events: Arc::new(DefaultCertificateEvents),
        }
    }

    pub fn scheme(mut self, name: impl Into<String>) -> Self {
        self.scheme.name = name.into();
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.scheme.display_name = Some(display_name.into());
        self
    }

    pub fn configure(mut self, f: impl FnOnce(&mut CertificateAuthenticationOptions)) -> Self {
        f(&mut self.options);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn CertificateTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn CertificateValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn mapper(mut self, mapper: Arc<dyn IdentityMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn events(mut self, events: Arc<dyn CertificateAuthenticationEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn build(self) -> CertificateAuthenticationHandler {
        CertificateAuthenticationHandler::new(
            self.scheme,
            Arc::new(self.options),
            self.transport,
            self.validator,
            self.mapper,
            self.events,
        )
    }
}

pub fn build_certificate_handler(config: &Config) -> Arc<CertificateAuthenticationHandler> {
    let transport: Arc<dyn CertificateTransport> = match &config.client_cert_header {
        Some(header) => Arc::new(ForwardedCertificateTransport::new(
            header.clone(),
            config.trust_forwarded_proto,
        )),
        None => Arc::new(TlsConnectionTransport),
    };

    let handler = CertificateAuthenticationBuilder::new()
        .scheme(config.scheme.clone())
        .transport(transport)
        .configure(|options| {
            options.claims_issuer = config.claims_issuer.clone();
            options.validator = config.validator.clone();
        })
        .build();

    Arc::new(handler)
}
