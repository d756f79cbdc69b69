/*
 * Responsibility
 * - Load settings from the environment (.env supported)
 * - Validate them up front (fail at startup rather than per request)
 * - Certificate scheme / validator policy / transport selection
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::HeaderName;

use crate::services::auth::handler::DEFAULT_SCHEME;
use crate::services::auth::validator::ValidatorOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout_seconds: u64,

    pub scheme: String,
    pub claims_issuer: Option<String>,
    // Reject requests without a certificate instead of passing them through anonymously.
    pub require_certificate: bool,

    // Some(header) => certificates are forwarded by a TLS-terminating proxy.
    pub client_cert_header: Option<HeaderName>,
    pub trust_forwarded_proto: bool,

    pub validator: ValidatorOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let request_timeout_seconds = match lookup("REQUEST_TIMEOUT_SECONDS") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            None => 30,
        };

        let scheme = lookup("CERT_AUTH_SCHEME")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());
        if scheme.is_empty() {
            return Err(ConfigError::Invalid("CERT_AUTH_SCHEME"));
        }

        let claims_issuer = lookup("CERT_AUTH_CLAIMS_ISSUER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let require_certificate = parse_bool(
            &lookup,
            "CERT_AUTH_REQUIRE_CERTIFICATE",
            false,
        )?;

        let client_cert_header = match lookup("CERT_AUTH_CLIENT_CERT_HEADER") {
            Some(v) if !v.trim().is_empty() => Some(
                HeaderName::from_str(&v.trim().to_ascii_lowercase())
                    .map_err(|_| ConfigError::Invalid("CERT_AUTH_CLIENT_CERT_HEADER"))?,
            ),
            _ => None,
        };

        let trust_forwarded_proto =
            parse_bool(&lookup, "CERT_AUTH_TRUST_FORWARDED_PROTO", false)?;

        let validator = ValidatorOptions {
            check_validity_period: parse_bool(&lookup, "CERT_AUTH_CHECK_VALIDITY", true)?,
            allowed_subjects: parse_list(&lookup, "CERT_AUTH_ALLOWED_SUBJECTS", ';'),
            allowed_issuers: parse_list(&lookup, "CERT_AUTH_ALLOWED_ISSUERS", ';'),
            allowed_dns_names: parse_list(&lookup, "CERT_AUTH_ALLOWED_DNS_NAMES", ','),
            allowed_thumbprints: parse_list(&lookup, "CERT_AUTH_ALLOWED_THUMBPRINTS", ','),
        };

        Ok(Self {
            addr,
            app_env,
            request_timeout_seconds,
            scheme,
            claims_issuer,
            require_certificate,
            client_cert_header,
            trust_forwarded_proto,
            validator,
        })
    }

    /// The bundled server listens on plain TCP, so certificates can only
    /// reach it through a TLS-terminating proxy. Without the forwarded header
    /// and a trusted forwarded proto no request could ever authenticate.
    pub fn ensure_forwarded_certificates(&self) -> Result<(), ConfigError> {
        if self.client_cert_header.is_none() {
            return Err(ConfigError::Missing("CERT_AUTH_CLIENT_CERT_HEADER"));
        }
        if !self.trust_forwarded_proto {
            return Err(ConfigError::Invalid("CERT_AUTH_TRUST_FORWARDED_PROTO"));
        }
        Ok(())
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

// Distinguished names contain commas, so DN lists are `;`-separated.
fn parse_list<F>(lookup: &F, key: &str, separator: char) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_default()
        .split(separator)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.scheme, "Certificate");
        assert_eq!(config.claims_issuer, None);
        assert!(!config.require_certificate);
        assert!(config.client_cert_header.is_none());
        assert_eq!(config.validator, ValidatorOptions::default());
    }

    #[test]
    fn reads_certificate_settings() {
        let config = config(&[
            ("APP_ENV", "prod"),
            ("CERT_AUTH_SCHEME", "client-certs"),
            ("CERT_AUTH_CLAIMS_ISSUER", "https://api.example"),
            ("CERT_AUTH_REQUIRE_CERTIFICATE", "true"),
            ("CERT_AUTH_CLIENT_CERT_HEADER", "X-SSL-Client-Cert"),
            ("CERT_AUTH_ALLOWED_ISSUERS", "CN=Acme CA, O=Acme; CN=Backup CA"),
            ("CERT_AUTH_ALLOWED_DNS_NAMES", "a.example, b.example"),
            ("CERT_AUTH_CHECK_VALIDITY", "off"),
        ])
        .unwrap();

        assert!(config.app_env.is_production());
        assert_eq!(config.scheme, "client-certs");
        assert_eq!(config.claims_issuer.as_deref(), Some("https://api.example"));
        assert!(config.require_certificate);
        assert_eq!(
            config.client_cert_header.as_ref().map(HeaderName::as_str),
            Some("x-ssl-client-cert")
        );
        assert_eq!(
            config.validator.allowed_issuers,
            vec!["CN=Acme CA, O=Acme".to_string(), "CN=Backup CA".to_string()]
        );
        assert_eq!(config.validator.allowed_dns_names.len(), 2);
        assert!(!config.validator.check_validity_period);
    }

    #[test]
    fn server_requires_forwarded_certificates() {
        assert_eq!(
            config(&[]).unwrap().ensure_forwarded_certificates(),
            Err(ConfigError::Missing("CERT_AUTH_CLIENT_CERT_HEADER"))
        );
        assert_eq!(
            config(&[("CERT_AUTH_CLIENT_CERT_HEADER", "x-client-cert")])
                .unwrap()
                .ensure_forwarded_certificates(),
            Err(ConfigError::Invalid("CERT_AUTH_TRUST_FORWARDED_PROTO"))
        );
        assert_eq!(
            config(&[
                ("CERT_AUTH_CLIENT_CERT_HEADER", "x-client-cert"),
                ("CERT_AUTH_TRUST_FORWARDED_PROTO", "true"),
            ])
            .unwrap()
            .ensure_forwarded_certificates(),
            Ok(())
        );
    }

    #[test]
    fn invalid_values_fail() {
        assert_eq!(
            config(&[("PORT", "http")]).unwrap_err(),
            ConfigError::Invalid("PORT")
        );
        assert_eq!(
            config(&[("CERT_AUTH_REQUIRE_CERTIFICATE", "maybe")]).unwrap_err(),
            ConfigError::Invalid("CERT_AUTH_REQUIRE_CERTIFICATE")
        );
        assert_eq!(
            config(&[("CERT_AUTH_SCHEME", "  ")]).unwrap_err(),
            ConfigError::Invalid("CERT_AUTH_SCHEME")
        );
    }
}
