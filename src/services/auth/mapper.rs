//! Certificate → identity mapping.
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use tower::BoxError;

use crate::services::auth::certificate::ClientCertificate;
use crate::services::auth::claims::{Identity, IdentityClaim, claim_types, value_types};

/// Builds the identity for a validated certificate.
///
/// An `Err` is treated by the handler as a processing fault and routed
/// through the authentication-failed event.
#[async_trait]
pub trait IdentityMapper: Send + Sync {
    async fn map(
        &self,
        scheme: &str,
        certificate: &ClientCertificate,
        claims_issuer: Option<&str>,
    ) -> Result<Identity, BoxError>;
}

/// Default mapper: always emits the same ten claims, in a fixed order, with an
/// empty value for attributes the certificate does not carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateIdentityMapper;

impl CertificateIdentityMapper {
    pub fn create(
        &self,
        scheme: &str,
        certificate: &ClientCertificate,
        claims_issuer: Option<&str>,
    ) -> Identity {
        let issuer = claims_issuer.unwrap_or(scheme);
        let original_issuer = certificate.issuer.as_str();
        let claim = |claim_type: &str, value: Option<&str>| {
            IdentityClaim::new(claim_type, value.unwrap_or_default(), issuer, original_issuer)
        };
        let thumbprint = STANDARD.encode(&certificate.thumbprint);

        let mut identity = Identity::new(scheme);
        identity.push(claim(claim_types::DNS, certificate.dns_name()));
        identity.push(claim(claim_types::EMAIL, certificate.email()));
        identity.push(claim(claim_types::ISSUER, Some(certificate.issuer.as_str())));
        identity.push(claim(claim_types::NAME, certificate.simple_name()));
        identity.push(
            claim(claim_types::NAME_IDENTIFIER, Some(thumbprint.as_str()))
                .with_value_type(value_types::BASE64_BINARY),
        );
        identity.push(claim(claim_types::SERIAL_NUMBER, Some(certificate.serial_number.as_str())));
        identity.push(
            claim(claim_types::THUMBPRINT, Some(thumbprint.as_str()))
                .with_value_type(value_types::BASE64_BINARY),
        );
        identity.push(claim(claim_types::UPN, certificate.upn()));
        identity.push(claim(claim_types::URI, certificate.uri()));
        identity.push(claim(
            claim_types::X500_DISTINGUISHED_NAME,
            Some(certificate.distinguished_name()),
        ));
        identity
    }
}

#[async_trait]
impl IdentityMapper for CertificateIdentityMapper {
    async fn map(
        &self,
        scheme: &str,
        certificate: &ClientCertificate,
        claims_issuer: Option<&str>,
    ) -> Result<Identity, BoxError> {
        Ok(self.create(scheme, certificate, claims_issuer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate() -> ClientCertificate {
        ClientCertificate {
            subject: "CN=alice, O=Acme".to_string(),
            issuer: "CN=Acme CA".to_string(),
            serial_number: "0A1B".to_string(),
            thumbprint: vec![0xDE, 0xAD, 0xBE, 0xEF],
            common_name: Some("alice".to_string()),
            dns_names: vec!["alice.acme.test".to_string()],
            emails: vec!["alice@acme.test".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn emits_ten_claims_in_order() {
        let identity = CertificateIdentityMapper.create("Certificate", &certificate(), None);

        let types: Vec<_> = identity.claims.iter().map(|c| c.claim_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                claim_types::DNS,
                claim_types::EMAIL,
                claim_types::ISSUER,
                claim_types::NAME,
                claim_types::NAME_IDENTIFIER,
                claim_types::SERIAL_NUMBER,
                claim_types::THUMBPRINT,
                claim_types::UPN,
                claim_types::URI,
                claim_types::X500_DISTINGUISHED_NAME,
            ]
        );

        let values: Vec<_> = identity.claims.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(
            values,
            vec![
                "alice.acme.test",
                "alice@acme.test",
                "CN=Acme CA",
                "alice",
                "3q2+7w==",
                "0A1B",
                "3q2+7w==",
                "",
                "",
                "CN=alice, O=Acme",
            ]
        );
        assert_eq!(identity.scheme, "Certificate");
    }

    #[test]
    fn missing_attributes_keep_their_claims() {
        let identity =
            CertificateIdentityMapper.create("Certificate", &ClientCertificate::default(), None);
        assert_eq!(identity.claims.len(), 10);
        assert!(identity.find_first(claim_types::UPN).unwrap().value.is_empty());
        assert!(identity.find_first(claim_types::EMAIL).unwrap().value.is_empty());
    }

    #[test]
    fn issuer_defaults_to_scheme_name() {
        let identity = CertificateIdentityMapper.create("client-certs", &certificate(), None);
        assert!(identity.claims.iter().all(|c| c.issuer == "client-certs"));
        assert!(identity.claims.iter().all(|c| c.original_issuer == "CN=Acme CA"));

        let identity =
            CertificateIdentityMapper.create("client-certs", &certificate(), Some("https://idp"));
        assert!(identity.claims.iter().all(|c| c.issuer == "https://idp"));
    }

    #[test]
    fn thumbprint_claims_are_base64_binary() {
        let identity = CertificateIdentityMapper.create("Certificate", &certificate(), None);
        for claim_type in [claim_types::NAME_IDENTIFIER, claim_types::THUMBPRINT] {
            let claim = identity.find_first(claim_type).unwrap();
            assert_eq!(claim.value_type, value_types::BASE64_BINARY);
        }
        let name = identity.find_first(claim_types::NAME).unwrap();
        assert_eq!(name.value_type, value_types::STRING);
    }

    #[tokio::test]
    async fn mapping_is_deterministic() {
        let cert = certificate();
        let first = CertificateIdentityMapper
            .map("Certificate", &cert, None)
            .await
            .unwrap();
        let second = CertificateIdentityMapper
            .map("Certificate", &cert, None)
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
