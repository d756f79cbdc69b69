//! Where client certificates come from.
//!
//! Two deployments are supported:
//! - the process terminates TLS itself and attaches `TlsConnectInfo` to each request,
//! - a reverse proxy terminates TLS and forwards the certificate in a header.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, header::HeaderValue, request::Parts};
use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tower::BoxError;

use crate::services::auth::certificate::ClientCertificate;

pub const DEFAULT_CLIENT_CERT_HEADER: &str = "x-client-cert";

const FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Connection-level access needed by the handler.
#[async_trait]
pub trait CertificateTransport: Send + Sync {
    /// Whether the request arrived over a confidential channel.
    fn is_secure(&self, request: &Parts) -> bool;

    /// The peer certificate, `None` when the client presented none.
    async fn client_certificate(
        &self,
        request: &Parts,
    ) -> Result<Option<ClientCertificate>, BoxError>;
}

/// TLS details of the connection a request arrived on, inserted into request
/// extensions by the TLS accept loop.
#[derive(Debug, Clone, Default)]
pub struct TlsConnectInfo {
    /// DER certificates presented by the peer, end-entity first.
    pub peer_certificates: Arc<Vec<Vec<u8>>>,
}

impl TlsConnectInfo {
    pub fn new(peer_certificates: Vec<Vec<u8>>) -> Self {
        Self {
            peer_certificates: Arc::new(peer_certificates),
        }
    }

    pub fn end_entity(&self) -> Option<&[u8]> {
        self.peer_certificates.first().map(Vec::as_slice)
    }
}

/// Reads the certificate from `TlsConnectInfo`. A request without it did not
/// come in over TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsConnectionTransport;

#[async_trait]
impl CertificateTransport for TlsConnectionTransport {
    fn is_secure(&self, request: &Parts) -> bool {
        request.extensions.get::<TlsConnectInfo>().is_some()
    }

    async fn client_certificate(
        &self,
        request: &Parts,
    ) -> Result<Option<ClientCertificate>, BoxError> {
        let Some(der) = request
            .extensions
            .get::<TlsConnectInfo>()
            .and_then(TlsConnectInfo::end_entity)
        else {
            return Ok(None);
        };
        Ok(Some(ClientCertificate::from_der(der)?))
    }
}

#[derive(Debug, Error)]
pub enum ForwardedCertificateError {
    #[error("client certificate header is not valid ASCII")]
    InvalidHeader,
    #[error("client certificate header is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Takes the certificate from a header set by a TLS-terminating proxy.
///
/// The header may carry PEM, URL-encoded PEM, or base64 DER. Only deploy this
/// behind a proxy that strips the header from client requests. A request is
/// secure only when `trust_forwarded_proto` is set and the proxy sent
/// `x-forwarded-proto: https`.
#[derive(Debug, Clone)]
pub struct ForwardedCertificateTransport {
    header: HeaderName,
    trust_forwarded_proto: bool,
}

impl ForwardedCertificateTransport {
    pub fn new(header: HeaderName, trust_forwarded_proto: bool) -> Self {
        Self {
            header,
            trust_forwarded_proto,
        }
    }
}

impl Default for ForwardedCertificateTransport {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_CLIENT_CERT_HEADER), false)
    }
}

#[async_trait]
impl CertificateTransport for ForwardedCertificateTransport {
    // The request-target scheme is client-controlled; only the proxy's
    // forwarded proto says anything about the client's connection.
    fn is_secure(&self, request: &Parts) -> bool {
        self.trust_forwarded_proto
            && request
                .headers
                .get(&FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
    }

    async fn client_certificate(
        &self,
        request: &Parts,
    ) -> Result<Option<ClientCertificate>, BoxError> {
        let Some(value) = request.headers.get(&self.header) else {
            return Ok(None);
        };
        if value.is_empty() {
            return Ok(None);
        }
        Ok(Some(decode_forwarded(value)?))
    }
}

fn decode_forwarded(value: &HeaderValue) -> Result<ClientCertificate, BoxError> {
    let raw = value
        .to_str()
        .map_err(|_| ForwardedCertificateError::InvalidHeader)?
        .trim();

    // Proxies commonly URL-encode PEM to fit it in a header.
    let decoded = if raw.contains('%') {
        urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string())
    } else {
        raw.to_string()
    };

    if decoded.contains("-----BEGIN") {
        return Ok(ClientCertificate::from_pem(decoded.as_bytes())?);
    }

    let der = STANDARD
        .decode(decoded.as_bytes())
        .map_err(ForwardedCertificateError::from)?;
    Ok(ClientCertificate::from_der(&der)?)
}
