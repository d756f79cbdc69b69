//! Per-attempt decision contexts handed to the authentication events.
//!
//! Exactly one of the two contexts exists per attempt. Setting a result on it
//! overrides what the handler would otherwise return.

use axum::http::request::Parts;

use crate::services::auth::certificate::ClientCertificate;
use crate::services::auth::claims::Identity;
use crate::services::auth::error::FaultCause;
use crate::services::auth::handler::{AuthenticationScheme, CertificateAuthenticationOptions};
use crate::services::auth::outcome::{AuthProperties, AuthenticateResult};

/// Operations shared by both contexts for deciding the outcome.
pub trait ResultContext {
    fn result_slot(&mut self) -> &mut Option<AuthenticateResult>;

    fn result(&self) -> Option<&AuthenticateResult>;

    /// Replace the outcome with an arbitrary one.
    fn handle(&mut self, result: AuthenticateResult) {
        *self.result_slot() = Some(result);
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.handle(AuthenticateResult::fail(message));
    }

    fn fail_with(&mut self, message: impl Into<String>, cause: FaultCause) {
        self.handle(AuthenticateResult::fail_with(message, cause));
    }

    fn no_result(&mut self) {
        self.handle(AuthenticateResult::NoResult);
    }
}

pub struct CertificateValidatedContext<'a> {
    pub request: &'a Parts,
    pub scheme: &'a AuthenticationScheme,
    pub options: &'a CertificateAuthenticationOptions,
    pub client_certificate: &'a ClientCertificate,
    /// Identity produced by the mapper; events may amend it before `success`.
    pub identity: Identity,
    pub properties: AuthProperties,
    result: Option<AuthenticateResult>,
}

impl<'a> CertificateValidatedContext<'a> {
    pub fn new(
        request: &'a Parts,
        scheme: &'a AuthenticationScheme,
        options: &'a CertificateAuthenticationOptions,
        client_certificate: &'a ClientCertificate,
        identity: Identity,
    ) -> Self {
        Self {
            request,
            scheme,
            options,
            client_certificate,
            identity,
            properties: AuthProperties::new(),
            result: None,
        }
    }

    /// Succeed with the current identity and properties.
    pub fn success(&mut self) {
        let result = AuthenticateResult::success(self.identity.clone(), self.properties.clone());
        self.handle(result);
    }

    /// The override if an event set one, otherwise success.
    pub fn into_result(self) -> AuthenticateResult {
        match self.result {
            Some(result) => result,
            None => AuthenticateResult::success(self.identity, self.properties),
        }
    }
}

impl ResultContext for CertificateValidatedContext<'_> {
    fn result_slot(&mut self) -> &mut Option<AuthenticateResult> {
        &mut self.result
    }

    fn result(&self) -> Option<&AuthenticateResult> {
        self.result.as_ref()
    }
}

pub struct AuthenticationFailedContext<'a> {
    pub request: &'a Parts,
    pub scheme: &'a AuthenticationScheme,
    pub options: &'a CertificateAuthenticationOptions,
    /// What made the attempt fail: a rejection or a processing fault.
    pub error: FaultCause,
    pub properties: AuthProperties,
    result: Option<AuthenticateResult>,
}

impl<'a> AuthenticationFailedContext<'a> {
    pub fn new(
        request: &'a Parts,
        scheme: &'a AuthenticationScheme,
        options: &'a CertificateAuthenticationOptions,
        error: FaultCause,
    ) -> Self {
        Self {
            request,
            scheme,
            options,
            error,
            properties: AuthProperties::new(),
            result: None,
        }
    }

    pub fn into_result(self) -> Option<AuthenticateResult> {
        self.result
    }
}

impl ResultContext for AuthenticationFailedContext<'_> {
    fn result_slot(&mut self) -> &mut Option<AuthenticateResult> {
        &mut self.result
    }

    fn result(&self) -> Option<&AuthenticateResult> {
        self.result.as_ref()
    }
}
