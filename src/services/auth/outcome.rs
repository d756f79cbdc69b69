use std::collections::BTreeMap;

use crate::services::auth::claims::Identity;
use crate::services::auth::error::FaultCause;

/// Free-form values attached to a successful authentication.
pub type AuthProperties = BTreeMap<String, String>;

/// Terminal result of one authentication attempt.
#[derive(Debug, Clone)]
pub enum AuthenticateResult {
    /// No credential was presented (or the channel was not secure).
    NoResult,
    Success {
        identity: Identity,
        properties: AuthProperties,
    },
    Failure {
        message: String,
        cause: Option<FaultCause>,
    },
}

impl AuthenticateResult {
    pub fn success(identity: Identity, properties: AuthProperties) -> Self {
        Self::Success {
            identity,
            properties,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            cause: None,
        }
    }

    pub fn fail_with(message: impl Into<String>, cause: FaultCause) -> Self {
        Self::Failure {
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::NoResult)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Success { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&AuthProperties> {
        match self {
            Self::Success { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failure { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn failure_cause(&self) -> Option<&FaultCause> {
        match self {
            Self::Failure { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }
}
