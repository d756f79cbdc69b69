pub mod certificate;
pub mod claims;
pub mod context;
pub mod error;
pub mod events;
pub mod factory;
pub mod handler;
pub mod mapper;
pub mod outcome;
pub mod transport;
pub mod validator;

pub use certificate::ClientCertificate;
pub use claims::{Identity, IdentityClaim};
pub use context::{AuthenticationFailedContext, CertificateValidatedContext, ResultContext};
pub use error::{AuthenticationError, FaultCause};
pub use events::CertificateAuthenticationEvents;
pub use factory::{CertificateAuthenticationBuilder, build_certificate_handler};
pub use handler::{
    AuthenticationScheme, CertificateAuthenticationHandler, CertificateAuthenticationOptions,
};
pub use outcome::{AuthProperties, AuthenticateResult};
pub use transport::{CertificateTransport, TlsConnectInfo};
pub use validator::{CertificateValidator, ValidationResult, ValidatorOptions};
