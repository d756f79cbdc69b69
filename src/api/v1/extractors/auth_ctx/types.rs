/*
 * Responsibility
 * - Authenticated request context as seen by handlers
 * - The certificate middleware inserts it into request extensions;
 *   handlers only receive this type
 */

use crate::services::auth::{AuthProperties, Identity};

/// Context attached to a request whose client certificate was accepted.
///
/// - `identity` carries the claims built from the certificate
/// - `properties` is whatever the validated event recorded
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: Identity,
    pub properties: AuthProperties,
}

impl AuthCtx {
    pub fn new(identity: Identity, properties: AuthProperties) -> Self {
        Self {
            identity,
            properties,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.identity.scheme
    }
}
