//! Client certificate as seen by the authentication core.
//!
//! The transport owns the raw certificate; the handler only ever borrows a
//! `ClientCertificate` for the duration of one attempt.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use x509_parser::der_parser::asn1_rs::{self, Any, FromDer, Tag, TaggedExplicit};
use x509_parser::prelude::*;

// Microsoft UPN (`szOID_NT_PRINCIPAL_NAME`) carried as a SAN otherName.
const UPN_OID: &str = "1.3.6.1.4.1.311.20.2.3";

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("invalid PEM certificate: {0}")]
    InvalidPem(String),
    #[error("invalid X.509 certificate: {0}")]
    InvalidDer(String),
    #[error("certificate validity out of range")]
    InvalidValidity,
}

/// Attributes of an X.509 client certificate consumed by validation and
/// identity mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCertificate {
    /// Subject distinguished name, e.g. `CN=Example, O=Acme`.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Serial number as upper-case hex without separators.
    pub serial_number: String,
    /// SHA-256 digest of the DER encoding.
    pub thumbprint: Vec<u8>,
    pub common_name: Option<String>,
    pub dns_names: Vec<String>,
    /// SAN rfc822 names first, then subject `emailAddress` attributes.
    pub emails: Vec<String>,
    pub upns: Vec<String>,
    pub uris: Vec<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub der: Vec<u8>,
}

impl ClientCertificate {
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertificateError::InvalidDer(e.to_string()))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(String::from);

        let mut dns_names = Vec::new();
        let mut emails = Vec::new();
        let mut upns = Vec::new();
        let mut uris = Vec::new();

        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                    GeneralName::RFC822Name(email) => emails.push(email.to_string()),
                    GeneralName::URI(uri) => uris.push(uri.to_string()),
                    GeneralName::OtherName(oid, value) if oid.to_id_string() == UPN_OID => {
                        if let Some(upn) = decode_utf8_other_name(value) {
                            upns.push(upn);
                        }
                    }
                    _ => {}
                }
            }
        }

        for email in cert.subject().iter_email() {
            if let Ok(email) = email.as_str() {
                if !emails.iter().any(|e| e == email) {
                    emails.push(email.to_string());
                }
            }
        }

        let validity = cert.validity();
        let not_before = DateTime::<Utc>::from_timestamp(validity.not_before.timestamp(), 0)
            .ok_or(CertificateError::InvalidValidity)?;
        let not_after = DateTime::<Utc>::from_timestamp(validity.not_after.timestamp(), 0)
            .ok_or(CertificateError::InvalidValidity)?;

        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial_number: hex::encode_upper(cert.raw_serial()),
            thumbprint: Sha256::digest(der).to_vec(),
            common_name,
            dns_names,
            emails,
            upns,
            uris,
            not_before,
            not_after,
            der: der.to_vec(),
        })
    }

    /// Parse the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CertificateError> {
        let (_, block) = x509_parser::pem::parse_x509_pem(pem)
            .map_err(|e| CertificateError::InvalidPem(e.to_string()))?;
        if block.label != "CERTIFICATE" {
            return Err(CertificateError::InvalidPem(format!(
                "unexpected PEM label {}",
                block.label
            )));
        }
        Self::from_der(&block.contents)
    }

    /// First DNS SAN, falling back to the subject CN.
    pub fn dns_name(&self) -> Option<&str> {
        self.dns_names
            .first()
            .map(String::as_str)
            .or(self.common_name.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    /// CN, else the first email, DNS name or URI.
    pub fn simple_name(&self) -> Option<&str> {
        self.common_name
            .as_deref()
            .or_else(|| self.email())
            .or_else(|| self.dns_names.first().map(String::as_str))
            .or_else(|| self.uri())
    }

    pub fn upn(&self) -> Option<&str> {
        self.upns.first().map(String::as_str)
    }

    pub fn uri(&self) -> Option<&str> {
        self.uris.first().map(String::as_str)
    }

    pub fn distinguished_name(&self) -> &str {
        &self.subject
    }
}

// otherName value is `[0] EXPLICIT` around the string.
fn decode_utf8_other_name(value: &[u8]) -> Option<String> {
    let (_, tagged) = TaggedExplicit::<Any, asn1_rs::Error, 0>::from_der(value).ok()?;
    let inner = tagged.into_inner();
    match inner.tag() {
        Tag::Utf8String | Tag::Ia5String | Tag::PrintableString => {
            std::str::from_utf8(inner.data).ok().map(String::from)
        }
        _ => None,
    }
}
