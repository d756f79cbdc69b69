//! Certificate validation contract and a policy-based validator.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower::BoxError;

use crate::services::auth::certificate::ClientCertificate;

/// Outcome of one validator call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Human readable reasons, in the order they were detected.
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            valid: false,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }
}

/// Validator configuration. Built once per scheme and shared read-only.
///
/// Empty allowlists place no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorOptions {
    pub check_validity_period: bool,
    pub allowed_subjects: Vec<String>,
    pub allowed_issuers: Vec<String>,
    pub allowed_dns_names: Vec<String>,
    /// Hex SHA-256 thumbprints, case-insensitive.
    pub allowed_thumbprints: Vec<String>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            check_validity_period: true,
            allowed_subjects: Vec::new(),
            allowed_issuers: Vec::new(),
            allowed_dns_names: Vec::new(),
            allowed_thumbprints: Vec::new(),
        }
    }
}

/// Chain, revocation and policy checks live behind this trait.
///
/// Returning `Err` means the validator could not reach a decision (e.g. a
/// revocation endpoint was unreachable); it is not a rejection.
#[async_trait]
pub trait CertificateValidator: Send + Sync {
    async fn validate(
        &self,
        certificate: &ClientCertificate,
        options: &ValidatorOptions,
    ) -> Result<ValidationResult, BoxError>;
}

/// Checks the validity window and the configured allowlists, reporting every
/// violation rather than the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyCertificateValidator;

impl PolicyCertificateValidator {
    pub fn validate_at(
        &self,
        certificate: &ClientCertificate,
        options: &ValidatorOptions,
        now: DateTime<Utc>,
    ) -> ValidationResult {
        let mut errors = Vec::new();

        if options.check_validity_period {
            if now < certificate.not_before {
                errors.push(format!(
                    "The certificate is not valid before {}.",
                    certificate.not_before.to_rfc3339()
                ));
            }
            if now > certificate.not_after {
                errors.push(format!(
                    "The certificate expired at {}.",
                    certificate.not_after.to_rfc3339()
                ));
            }
        }

        if !is_allowed(&options.allowed_subjects, |s| s == &certificate.subject) {
            errors.push(format!(
                "The subject \"{}\" is not allowed.",
                certificate.subject
            ));
        }

        if !is_allowed(&options.allowed_issuers, |s| s == &certificate.issuer) {
            errors.push(format!(
                "The issuer \"{}\" is not allowed.",
                certificate.issuer
            ));
        }

        if !is_allowed(&options.allowed_dns_names, |s| {
            certificate.dns_names.iter().any(|dns| dns.eq_ignore_ascii_case(s))
        }) {
            errors.push("None of the certificate DNS names is allowed.".to_string());
        }

        let thumbprint = hex::encode(&certificate.thumbprint);
        if !is_allowed(&options.allowed_thumbprints, |s| {
            s.eq_ignore_ascii_case(&thumbprint)
        }) {
            errors.push(format!("The thumbprint {thumbprint} is not allowed."));
        }

        if errors.is_empty() {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid(errors)
        }
    }
}

fn is_allowed(allowlist: &[String], matches: impl Fn(&String) -> bool) -> bool {
    allowlist.is_empty() || allowlist.iter().any(matches)
}

#[async_trait]
impl CertificateValidator for PolicyCertificateValidator {
    async fn validate(
        &self,
        certificate: &ClientCertificate,
        options: &ValidatorOptions,
    ) -> Result<ValidationResult, BoxError> {
        Ok(self.validate_at(certificate, options, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    fn certificate() -> ClientCertificate {
        ClientCertificate {
            subject: "CN=alice".to_string(),
            issuer: "CN=Acme CA".to_string(),
            thumbprint: vec![0xAB, 0xCD],
            dns_names: vec!["alice.acme.test".to_string()],
            not_before: at(2024),
            not_after: at(2026),
            ..Default::default()
        }
    }

    #[test]
    fn default_options_accept_a_current_certificate() {
        let result =
            PolicyCertificateValidator.validate_at(&certificate(), &ValidatorOptions::default(), at(2025));
        assert_eq!(result, ValidationResult::valid());
    }

    #[test]
    fn validity_window_is_enforced() {
        let options = ValidatorOptions::default();

        let early = PolicyCertificateValidator.validate_at(&certificate(), &options, at(2023));
        assert!(!early.valid);
        assert!(early.errors[0].contains("not valid before"));

        let late = PolicyCertificateValidator.validate_at(&certificate(), &options, at(2027));
        assert!(!late.valid);
        assert!(late.errors[0].contains("expired"));

        let unchecked = ValidatorOptions {
            check_validity_period: false,
            ..Default::default()
        };
        assert!(PolicyCertificateValidator.validate_at(&certificate(), &unchecked, at(2027)).valid);
    }

    #[test]
    fn reports_every_violation_in_order() {
        let options = ValidatorOptions {
            allowed_subjects: vec!["CN=bob".to_string()],
            allowed_issuers: vec!["CN=Other CA".to_string()],
            allowed_dns_names: vec!["bob.acme.test".to_string()],
            allowed_thumbprints: vec!["ffff".to_string()],
            ..Default::default()
        };

        let result = PolicyCertificateValidator.validate_at(&certificate(), &options, at(2027));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 5);
        assert!(result.errors[0].contains("expired"));
        assert!(result.errors[1].contains("CN=alice"));
        assert!(result.errors[2].contains("CN=Acme CA"));
        assert!(result.errors[3].contains("DNS"));
        assert!(result.errors[4].contains("abcd"));
    }

    #[test]
    fn allowlists_match() {
        let options = ValidatorOptions {
            allowed_subjects: vec!["CN=alice".to_string()],
            allowed_dns_names: vec!["ALICE.acme.test".to_string()],
            allowed_thumbprints: vec!["ABCD".to_string()],
            ..Default::default()
        };
        assert!(PolicyCertificateValidator.validate_at(&certificate(), &options, at(2025)).valid);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ValidatorOptions =
            serde_json::from_str(r#"{ "allowed_issuers": ["CN=Acme CA"] }"#).unwrap();
        assert!(options.check_validity_period);
        assert_eq!(options.allowed_issuers, vec!["CN=Acme CA".to_string()]);
        assert!(serde_json::from_str::<ValidatorOptions>(r#"{ "bogus": 1 }"#).is_err());
    }
}
